//! Control vocabulary shared by configuration, views and the command line.

use crate::error::DmVizError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a fieldless control enum whose variants map to fixed
/// `snake_case` names for serde, `Display` and `FromStr`.
macro_rules! control_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable lowercase name of the variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DmVizError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $( $label => Ok(Self::$variant), )+
                    _ => Err(DmVizError::validation_field(
                        format!("Unknown {} '{}'", $field, s),
                        $field,
                    )),
                }
            }
        }
    };
}

control_enum! {
    /// What a per-period ranking compares.
    RankMode, "rank_mode" {
        /// Rank by the raw value of each period.
        Period => "period",
        /// Rank by the running sum up to and including each period.
        Cumulative => "cumulative",
    }
}

control_enum! {
    /// Baseline policy for stacked series.
    StackOffset, "stack_offset" {
        /// Zero baseline.
        None => "none",
        /// Columns centred around zero.
        Silhouette => "silhouette",
        /// Baseline chosen to minimise weighted slope change.
        Wiggle => "wiggle",
        /// Columns normalised to sum to one.
        Expand => "expand",
    }
}

control_enum! {
    /// Order in which series are stacked.
    StackOrder, "stack_order" {
        /// Key order as given.
        None => "none",
        /// Earliest peaks in the middle, later peaks on the outside.
        InsideOut => "inside_out",
    }
}

control_enum! {
    /// Which maximum a heatmap cell is scaled against.
    HeatmapScale, "heatmap_scale" {
        /// Maximum over every visible cell.
        Global => "global",
        /// Maximum of the cell's own row.
        Row => "row",
    }
}

control_enum! {
    /// Sort key for the response time chart.
    ResponseSort, "response_sort" {
        /// Fastest own replies first.
        MyResponse => "my_response",
        /// Fastest correspondent replies first.
        TheirResponse => "their_response",
        /// Own minus correspondent reply time, ascending.
        Difference => "difference",
    }
}

control_enum! {
    /// How equal values are ordered when ranking.
    TieBreak, "tie_break" {
        /// Stable sort over the order entities appear in the table.
        InsertionOrder => "insertion_order",
        /// Ascending entity name.
        Name => "name",
    }
}

impl Default for RankMode {
    fn default() -> Self {
        Self::Cumulative
    }
}

impl Default for StackOffset {
    fn default() -> Self {
        Self::Silhouette
    }
}

impl Default for StackOrder {
    fn default() -> Self {
        Self::InsideOut
    }
}

impl Default for HeatmapScale {
    fn default() -> Self {
        Self::Global
    }
}

impl Default for ResponseSort {
    fn default() -> Self {
        Self::Difference
    }
}

impl Default for TieBreak {
    fn default() -> Self {
        Self::InsertionOrder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_dashes_and_case() {
        assert_eq!("Cumulative".parse::<RankMode>().unwrap(), RankMode::Cumulative);
        assert_eq!("inside-out".parse::<StackOrder>().unwrap(), StackOrder::InsideOut);
        assert_eq!("my-response".parse::<ResponseSort>().unwrap(), ResponseSort::MyResponse);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "zigzag".parse::<StackOffset>().unwrap_err();
        assert!(err.to_string().contains("stack_offset"));
    }

    #[test]
    fn test_display_matches_serde() {
        for offset in StackOffset::ALL {
            let json = serde_json::to_string(offset).unwrap();
            assert_eq!(json, format!("\"{offset}\""));
        }
        assert_eq!(TieBreak::InsertionOrder.to_string(), "insertion_order");
    }
}
