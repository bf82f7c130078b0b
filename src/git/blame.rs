use crate::error::{GcontribError, Result};

/// Author and commit time of one blamed line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlameLine {
    pub author: String,
    pub timestamp: i64,
}

/// Parse `git blame --line-porcelain` output.
///
/// Every line block repeats the full commit headers and ends with the line
/// content prefixed by a tab.
pub fn parse_line_porcelain(text: &str) -> Result<Vec<BlameLine>> {
    let mut lines = Vec::new();
    let mut author: Option<&str> = None;
    let mut timestamp: Option<i64> = None;

    for (n, line) in text.lines().enumerate() {
        if line.starts_with('\t') {
            match (author.take(), timestamp.take()) {
                (Some(a), Some(t)) => lines.push(BlameLine {
                    author: a.to_string(),
                    timestamp: t,
                }),
                _ => {
                    return Err(GcontribError::Parse(format!(
                        "blame line {} has no author header",
                        n + 1
                    )))
                }
            }
        } else if let Some(name) = line.strip_prefix("author ") {
            author = Some(name.trim());
        } else if let Some(secs) = line.strip_prefix("author-time ") {
            let secs = secs
                .trim()
                .parse::<i64>()
                .map_err(|e| GcontribError::Parse(format!("bad author-time {secs:?}: {e}")))?;
            timestamp = Some(secs);
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
4b825dc642cb6eb9a060e54bf8d69288fbee4904 1 1 2
author Ada Lovelace
author-mail <ada@example.com>
author-time 1700000000
author-tz +0000
committer Ada Lovelace
committer-mail <ada@example.com>
committer-time 1700000000
committer-tz +0000
summary init
boundary
filename src/lib.rs
\tpub fn a() {}
4b825dc642cb6eb9a060e54bf8d69288fbee4904 2 2
author Ada Lovelace
author-mail <ada@example.com>
author-time 1700000000
author-tz +0000
committer Ada Lovelace
committer-mail <ada@example.com>
committer-time 1700000000
committer-tz +0000
summary init
filename src/lib.rs
\t
9fceb02d0ae598e95dc970b74767f19372d61af8 3 3 1
author Grace Hopper
author-mail <grace@example.com>
author-time 1710000000
author-tz -0500
committer Grace Hopper
committer-mail <grace@example.com>
committer-time 1710000000
committer-tz -0500
summary add b
previous 4b825dc642cb6eb9a060e54bf8d69288fbee4904 src/lib.rs
filename src/lib.rs
\tpub fn b() {}
";

    #[test]
    fn one_entry_per_line() {
        let lines = parse_line_porcelain(SAMPLE).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].author, "Ada Lovelace");
        assert_eq!(lines[1].timestamp, 1_700_000_000);
        assert_eq!(lines[2].author, "Grace Hopper");
        assert_eq!(lines[2].timestamp, 1_710_000_000);
    }

    #[test]
    fn content_without_headers_is_an_error() {
        assert!(parse_line_porcelain("\torphan\n").is_err());
    }

    #[test]
    fn empty_output_is_empty() {
        assert!(parse_line_porcelain("").unwrap().is_empty());
    }
}
