//! Depth column names of in-situ groups.
//!
//! Most groups name their depths `{GROUP}_TOP` and `{GROUP}_BASE`. The
//! groups below do not, so their columns are looked up here.

use crate::table::GroupTable;

/// Where the base depth of a group lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseColumn {
    /// `{GROUP}_BASE`.
    Default,
    /// A specific column.
    Named(&'static str),
}

/// Depth columns for one or more group names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthRule {
    pub groups: &'static [&'static str],
    /// `None` means `{GROUP}_TOP`.
    pub top: Option<&'static str>,
    pub base: BaseColumn,
    /// Column used as top, with no base, when the top column is absent.
    pub fallback_top: Option<&'static str>,
}

const fn top(groups: &'static [&'static str], column: &'static str) -> DepthRule {
    DepthRule {
        groups,
        top: Some(column),
        base: BaseColumn::Default,
        fallback_top: None,
    }
}

pub const AGS3_DEPTH_RULES: &[DepthRule] = &[
    top(&["CDIA"], "CDIA_CDEP"),
    DepthRule {
        groups: &["FLSH"],
        top: Some("FLSH_FROM"),
        base: BaseColumn::Named("FLSH_TO"),
        fallback_top: None,
    },
    DepthRule {
        groups: &["CORE"],
        top: None,
        base: BaseColumn::Named("CORE_BOT"),
        fallback_top: None,
    },
    top(&["HDIA"], "HDIA_HDEP"),
    top(&["PTIM"], "PTIM_DEP"),
    top(&["IVAN"], "IVAN_DPTH"),
    top(&["STCN"], "STCN_DPTH"),
    top(&["POBS", "PREF"], "PREF_TDEP"),
    top(&["DREM"], "DREM_DPTH"),
    top(&["PRTD", "PRTG", "PRTL"], "PRTD_DPTH"),
    DepthRule {
        groups: &["IPRM"],
        top: None,
        base: BaseColumn::Default,
        fallback_top: Some("IPRM_BASE"),
    },
];

pub const AGS4_DEPTH_RULES: &[DepthRule] = &[
    top(&["CDIA"], "CDIA_DPTH"),
    top(&["DCPG", "DCPT"], "DCPG_DPTH"),
    top(&["DPRB"], "DPRB_DPTH"),
    top(&["HDIA"], "HDIA_DPTH"),
    top(&["ICBR"], "ICBR_DPTH"),
    top(&["IDEN"], "IDEN_DPTH"),
    top(&["IFID"], "IFID_DPTH"),
    top(&["IPEN"], "IPEN_DPTH"),
    top(&["IPID"], "IPID_DPTH"),
    top(&["IPRT"], "IPRT_DPTH"),
    top(&["IRDX"], "IRDX_DPTH"),
    top(&["IRES"], "IRES_DPTH"),
    top(&["ISAT"], "ISAT_DPTH"),
    top(&["IVAN"], "IVAN_DPTH"),
    top(&["PLTG", "PLTT"], "PLTG_DPTH"),
    top(&["PMTG", "PMTD", "PMTL"], "PMTG_DPTH"),
    top(&["PTIM"], "PTIM_DPTH"),
    top(&["PUMT"], "PUMT_DPTH"),
    top(&["SCDG", "SCDT"], "SCDG_DPTH"),
    top(&["SCPT"], "SCPT_DPTH"),
    top(&["WGPT"], "WGPT_DPTH"),
    top(&["WSTG", "WSTD"], "WSTG_DPTH"),
];

/// Resolved depth columns of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthColumns {
    pub top: String,
    pub base: Option<String>,
    /// True if the top column is a fallback for a missing one.
    pub fell_back: bool,
}

/// Why depth columns could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDepth {
    /// The top column that was expected.
    pub expected_top: String,
}

/// Resolve the depth columns of `group` against `rules`.
///
/// A base column absent from the headers resolves to no base.
pub fn resolve_depth_columns(
    rules: &[DepthRule],
    group: &GroupTable,
) -> Result<DepthColumns, MissingDepth> {
    let name = group.name.as_str();
    let rule = rules.iter().find(|r| r.groups.contains(&name));

    let top = rule
        .and_then(|r| r.top)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}_TOP", name));
    let base = match rule.map(|r| r.base).unwrap_or(BaseColumn::Default) {
        BaseColumn::Default => format!("{}_BASE", name),
        BaseColumn::Named(column) => column.to_string(),
    };

    if group.has_column(&top) {
        return Ok(DepthColumns {
            top,
            base: group.has_column(&base).then_some(base),
            fell_back: false,
        });
    }

    match rule.and_then(|r| r.fallback_top) {
        Some(fallback) if group.has_column(fallback) => Ok(DepthColumns {
            top: fallback.to_string(),
            base: None,
            fell_back: true,
        }),
        _ => Err(MissingDepth { expected_top: top }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, headers: &[&str]) -> GroupTable {
        GroupTable::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            vec![],
        )
    }

    #[test]
    fn test_default_columns() {
        let cols = resolve_depth_columns(
            AGS3_DEPTH_RULES,
            &group("GEOL", &["HOLE_ID", "GEOL_TOP", "GEOL_BASE"]),
        )
        .unwrap();
        assert_eq!(cols.top, "GEOL_TOP");
        assert_eq!(cols.base.as_deref(), Some("GEOL_BASE"));
    }

    #[test]
    fn test_single_depth_groups() {
        let cols = resolve_depth_columns(
            AGS3_DEPTH_RULES,
            &group("PREF", &["HOLE_ID", "PREF_TDEP"]),
        )
        .unwrap();
        assert_eq!(cols.top, "PREF_TDEP");
        assert_eq!(cols.base, None);

        let cols =
            resolve_depth_columns(AGS3_DEPTH_RULES, &group("POBS", &["HOLE_ID", "PREF_TDEP"]))
                .unwrap();
        assert_eq!(cols.top, "PREF_TDEP");
    }

    #[test]
    fn test_from_to_and_core() {
        let flsh = resolve_depth_columns(
            AGS3_DEPTH_RULES,
            &group("FLSH", &["HOLE_ID", "FLSH_FROM", "FLSH_TO"]),
        )
        .unwrap();
        assert_eq!((flsh.top.as_str(), flsh.base.as_deref()), ("FLSH_FROM", Some("FLSH_TO")));

        let core = resolve_depth_columns(
            AGS3_DEPTH_RULES,
            &group("CORE", &["HOLE_ID", "CORE_TOP", "CORE_BOT"]),
        )
        .unwrap();
        assert_eq!((core.top.as_str(), core.base.as_deref()), ("CORE_TOP", Some("CORE_BOT")));
    }

    #[test]
    fn test_iprm_fallback() {
        let cols = resolve_depth_columns(
            AGS3_DEPTH_RULES,
            &group("IPRM", &["HOLE_ID", "IPRM_BASE"]),
        )
        .unwrap();
        assert_eq!(cols.top, "IPRM_BASE");
        assert_eq!(cols.base, None);
        assert!(cols.fell_back);
    }

    #[test]
    fn test_missing_top() {
        let err = resolve_depth_columns(AGS3_DEPTH_RULES, &group("ISPT", &["HOLE_ID"]))
            .unwrap_err();
        assert_eq!(err.expected_top, "ISPT_TOP");
    }

    #[test]
    fn test_ags4_rules() {
        let cols = resolve_depth_columns(
            AGS4_DEPTH_RULES,
            &group("ISPT", &["LOCA_ID", "ISPT_TOP"]),
        )
        .unwrap();
        assert_eq!(cols.top, "ISPT_TOP");

        let cols = resolve_depth_columns(
            AGS4_DEPTH_RULES,
            &group("SCPT", &["LOCA_ID", "SCPT_DPTH"]),
        )
        .unwrap();
        assert_eq!(cols.top, "SCPT_DPTH");
    }
}
