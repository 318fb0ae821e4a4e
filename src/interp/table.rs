//! Operator table: keyword to handler.
//!
//! Built once on first use and shared read-only by every session.

use super::ops::{color, misc, path, state, text, xobject};
use super::{PdfResult, RenderSession};
use crate::error::Result;
use crate::surface::DrawingSurface;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Operator handler.
///
/// Library errors (operand underflow, wrong operand type, ...) returned by a
/// handler are reported as [`PdfResult::IgnoreError`] by the dispatcher.
pub type OperatorFn = fn(&mut RenderSession<'_>, &mut dyn DrawingSurface) -> Result<PdfResult>;

/// Looper spawned after an operator's handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildLooper {
    /// `BX` ... `EX`
    Compatibility,
    /// `BI` ... `ID` data `EI`
    InlineImage,
}

/// One table entry.
#[derive(Clone, Copy)]
pub struct OperatorDef {
    /// Handler
    pub handler: OperatorFn,
    /// Looper to run once the handler returns
    pub child: Option<ChildLooper>,
}

impl std::fmt::Debug for OperatorDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorDef")
            .field("child", &self.child)
            .finish_non_exhaustive()
    }
}

lazy_static! {
    static ref OPERATORS: HashMap<&'static str, OperatorDef> = build_table();
}

fn build_table() -> HashMap<&'static str, OperatorDef> {
    let plain: &[(&'static str, OperatorFn)] = &[
        // Special graphics state
        ("q", state::op_q),
        ("Q", state::op_big_q),
        ("cm", state::op_cm),
        // Path construction
        ("m", path::op_m),
        ("l", path::op_l),
        ("c", path::op_c),
        ("v", path::op_v),
        ("y", path::op_y),
        ("h", path::op_h),
        ("re", path::op_re),
        // Path painting
        ("S", path::op_big_s),
        ("s", path::op_s),
        ("f", path::op_f),
        ("F", path::op_f),
        ("f*", path::op_f_star),
        ("B", path::op_big_b),
        ("B*", path::op_big_b_star),
        ("b", path::op_b),
        ("b*", path::op_b_star),
        ("n", path::op_n),
        // Clipping
        ("W", path::op_w_clip),
        ("W*", path::op_w_clip_star),
        // Text objects and positioning
        ("BT", text::op_bt),
        ("ET", text::op_et),
        ("Td", text::op_td),
        ("TD", text::op_big_td),
        ("Tm", text::op_tm),
        ("T*", text::op_t_star),
        // Text state
        ("Tc", text::op_tc),
        ("Tw", text::op_tw),
        ("Tz", text::op_tz),
        ("TL", text::op_tl),
        ("Tf", text::op_tf),
        ("Tr", text::op_tr),
        ("Ts", text::op_ts),
        // Text showing
        ("Tj", text::op_tj),
        ("'", text::op_quote),
        ("\"", text::op_double_quote),
        ("TJ", text::op_big_tj),
        // Color
        ("CS", color::op_big_cs),
        ("cs", color::op_cs),
        ("SC", color::op_big_sc),
        ("sc", color::op_sc),
        ("SCN", color::op_big_scn),
        ("scn", color::op_scn),
        ("G", color::op_big_g),
        ("g", color::op_g),
        ("RG", color::op_big_rg),
        ("rg", color::op_rg),
        ("K", color::op_big_k),
        ("k", color::op_k),
        // Line style
        ("w", state::op_w),
        ("J", state::op_big_j),
        ("j", state::op_j),
        ("M", state::op_big_m),
        ("d", state::op_d),
        ("ri", state::op_ri),
        ("i", state::op_i),
        ("gs", state::op_gs),
        // XObjects and shading
        ("Do", xobject::op_do),
        ("sh", misc::op_sh),
        // Marked content
        ("MP", misc::op_mp),
        ("DP", misc::op_dp),
        ("BMC", misc::op_bmc),
        ("BDC", misc::op_bdc),
        ("EMC", misc::op_emc),
        // Type 3 glyphs
        ("d0", misc::op_d0),
        ("d1", misc::op_d1),
        // Looper markers reached outside their looper
        ("EX", misc::op_stray_marker),
        ("ID", misc::op_stray_marker),
        ("EI", misc::op_stray_marker),
    ];

    let mut table: HashMap<&'static str, OperatorDef> = plain
        .iter()
        .map(|&(kw, handler)| {
            (
                kw,
                OperatorDef {
                    handler,
                    child: None,
                },
            )
        })
        .collect();
    table.insert(
        "BX",
        OperatorDef {
            handler: misc::op_begin_section,
            child: Some(ChildLooper::Compatibility),
        },
    );
    table.insert(
        "BI",
        OperatorDef {
            handler: misc::op_begin_section,
            child: Some(ChildLooper::InlineImage),
        },
    );
    table
}

/// Entry for `keyword`, if it is a known operator.
pub fn lookup(keyword: &str) -> Option<OperatorDef> {
    OPERATORS.get(keyword).copied()
}

/// Every known keyword, in no particular order.
pub fn keywords() -> impl Iterator<Item = &'static str> {
    OPERATORS.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_operator_set() {
        for kw in [
            "q", "Q", "cm", "m", "l", "c", "v", "y", "h", "re", "S", "s", "f", "F", "f*", "B",
            "B*", "b", "b*", "n", "W", "W*", "BT", "ET", "Td", "TD", "Tm", "T*", "Tc", "Tw",
            "Tz", "TL", "Tf", "Tr", "Ts", "Tj", "'", "\"", "TJ", "CS", "cs", "SC", "SCN", "sc",
            "scn", "G", "g", "RG", "rg", "K", "k", "w", "J", "j", "M", "d", "ri", "i", "gs",
            "Do", "sh", "MP", "DP", "BMC", "BDC", "EMC", "d0", "d1", "BX", "EX", "BI", "ID",
            "EI",
        ] {
            assert!(lookup(kw).is_some(), "missing operator {}", kw);
        }
        assert_eq!(keywords().count(), 73);
    }

    #[test]
    fn test_only_bx_and_bi_spawn_children() {
        let spawning: Vec<_> = keywords().filter(|k| lookup(k).and_then(|d| d.child).is_some()).collect();
        assert_eq!(spawning.len(), 2);
        assert_eq!(lookup("BX").and_then(|d| d.child), Some(ChildLooper::Compatibility));
        assert_eq!(lookup("BI").and_then(|d| d.child), Some(ChildLooper::InlineImage));
    }

    #[test]
    fn test_unknown_keyword() {
        assert!(lookup("foo").is_none());
        assert!(lookup("").is_none());
    }
}
