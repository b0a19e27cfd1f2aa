//! Compresses lists of physical channel names into the bracketed range notation used when
//! printing device and task reports, e.g.
//! `["Dev1/ai0", "Dev1/ai1", "Dev1/ai2", "Dev1/ao0"]` becomes `Dev1/{ai0:2,ao0}`.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::error::{DaqmxError, Result};

fn digit_split() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\D*)(.*)$").unwrap())
}

/// Compresses `paths` into a pattern string.
///
/// Paths are grouped by the component before their first `/`; within a group the remainders are
/// compressed recursively and wrapped in `{...}` when they do not collapse into a single item.
/// Names without a `/` (such as `ao3` or `line7`) are split before their first digit instead, and
/// the numeric suffixes of a group collapse into a `first:last` range.
///
/// Fails if names with and without `/` are mixed at the same level, or if numeric suffixes of a
/// group are not contiguous.
///
/// # Example
/// ```
/// use nidaqmx_common::make_pattern;
///
/// let paths = ["Dev1/ao1", "Dev1/ao2", "Dev1/ao3", "Dev0/ao1"];
/// assert_eq!(make_pattern(&paths).unwrap(), "Dev0/ao1,Dev1/ao1:3");
/// ```
pub fn make_pattern<S: AsRef<str>>(paths: &[S]) -> Result<String> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut bare_words: Option<bool> = None;

    for path in paths.iter().map(|p| p.as_ref()) {
        let is_bare = !path.contains('/');
        match bare_words {
            Some(prev) if prev != is_bare => {
                return Err(DaqmxError::Pattern(format!(
                    "{:?} mixes names with and without '/'",
                    paths.iter().map(|p| p.as_ref()).collect::<Vec<_>>()
                )));
            }
            _ => bare_words = Some(is_bare),
        }
        let (prefix, rest) = match (path.split_once('/'), digit_split().captures(path)) {
            (Some((prefix, rest)), _) => (prefix.to_string(), rest.to_string()),
            (None, Some(caps)) => (caps[1].to_string(), caps[2].to_string()),
            (None, None) => (path.to_string(), String::new()),
        };
        groups.entry(prefix).or_default().insert(rest);
    }
    let bare_words = bare_words.unwrap_or(false);
    let sep = if bare_words { "" } else { "/" };

    let mut items: Vec<String> = Vec::with_capacity(groups.len());
    for (prefix, rests) in &groups {
        if let (1, Some(rest)) = (rests.len(), rests.iter().next()) {
            items.push(format!("{}{}{}", prefix, sep, rest));
        } else if !prefix.is_empty() {
            let rests: Vec<&String> = rests.iter().collect();
            let mut sub = make_pattern(&rests)?;
            if sub.contains(',') {
                sub = format!("{{{}}}", sub);
            }
            items.push(format!("{}{}{}", prefix, sep, sub));
        } else {
            items.push(numeric_range(rests)?);
        }
    }
    Ok(items.join(","))
}

// Collapses contiguous integers into "first:last"
fn numeric_range(rests: &BTreeSet<String>) -> Result<String> {
    let mut nums = rests
        .iter()
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| DaqmxError::Pattern(format!("{:?} is not a channel number", s)))
        })
        .collect::<Result<Vec<u64>>>()?;
    nums.sort_unstable();
    let (first, last) = (nums[0], nums[nums.len() - 1]);
    if last - first != (nums.len() - 1) as u64 {
        return Err(DaqmxError::Pattern(format!("{:?} is not a contiguous range", nums)));
    }
    if first == last {
        Ok(first.to_string())
    } else {
        Ok(format!("{}:{}", first, last))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn growing_channel_lists() {
        let mut paths: Vec<&str> = vec![
            "Dev1/ao1", "Dev1/ao2", "Dev1/ao3", "Dev1/ao4", "Dev1/ao5", "Dev1/ao6", "Dev1/ao7",
        ];
        assert_eq!(make_pattern(&paths).unwrap(), "Dev1/ao1:7");

        paths.push("Dev0/ao1");
        assert_eq!(make_pattern(&paths).unwrap(), "Dev0/ao1,Dev1/ao1:7");

        paths.push("Dev0/ao0");
        assert_eq!(make_pattern(&paths).unwrap(), "Dev0/ao0:1,Dev1/ao1:7");

        paths.extend(["Dev1/ai1", "Dev1/ai2", "Dev1/ai3"]);
        assert_eq!(make_pattern(&paths).unwrap(), "Dev0/ao0:1,Dev1/{ai1:3,ao1:7}");

        paths.push("Dev2/port0/line0");
        assert_eq!(
            make_pattern(&paths).unwrap(),
            "Dev0/ao0:1,Dev1/{ai1:3,ao1:7},Dev2/port0/line0"
        );

        paths.push("Dev2/port0/line1");
        assert_eq!(
            make_pattern(&paths).unwrap(),
            "Dev0/ao0:1,Dev1/{ai1:3,ao1:7},Dev2/port0/line0:1"
        );

        paths.extend(["Dev2/port1/line0", "Dev2/port1/line1"]);
        assert_eq!(
            make_pattern(&paths).unwrap(),
            "Dev0/ao0:1,Dev1/{ai1:3,ao1:7},Dev2/{port0/line0:1,port1/line0:1}"
        );
    }

    #[test]
    fn numbers_sort_numerically() {
        let paths = ["Dev1/ai10", "Dev1/ai9", "Dev1/ai8", "Dev1/ai11"];
        assert_eq!(make_pattern(&paths).unwrap(), "Dev1/ai8:11");
    }

    #[test]
    fn empty_and_single() {
        let empty: [&str; 0] = [];
        assert_eq!(make_pattern(&empty).unwrap(), "");
        assert_eq!(make_pattern(&["Dev3"]).unwrap(), "Dev3");
        assert_eq!(make_pattern(&["PXI1Slot2/ctr0"]).unwrap(), "PXI1Slot2/ctr0");
    }

    #[test]
    fn gaps_are_rejected() {
        let err = make_pattern(&["Dev1/ai0", "Dev1/ai2"]).unwrap_err();
        assert!(matches!(err, DaqmxError::Pattern(_)));
    }

    #[test]
    fn full_width_numbers() {
        let err = make_pattern(&["Dev1/ai0", "Dev1/ai18446744073709551615"]).unwrap_err();
        assert!(matches!(err, DaqmxError::Pattern(_)));
        let top = ["Dev1/ai18446744073709551614", "Dev1/ai18446744073709551615"];
        assert_eq!(make_pattern(&top).unwrap(), "Dev1/ai18446744073709551614:18446744073709551615");
    }

    #[test]
    fn mixed_levels_are_rejected() {
        assert!(make_pattern(&["Dev1/ai0", "ai1"]).is_err());
        assert!(make_pattern(&["ai1", "Dev1/ai0"]).is_err());
    }
}
