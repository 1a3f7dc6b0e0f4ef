//! Lookup-table files: one `index channel value` entry per line.
//!
//! `channel` is `castor`/`pollux` or `0`/`1`; `value` is decimal or `0x` hex.
//! Blank lines and `#` comments are ignored.

use anyhow::{Context, Result, anyhow, bail};
use gemini_lib::LutChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LutEntry {
    pub index: u8,
    pub channel: LutChannel,
    pub value: u16,
}

pub fn parse(text: &str) -> Result<Vec<LutEntry>> {
    let mut entries = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let entry = parse_line(line).with_context(|| format!("line {}: {:?}", n + 1, line))?;
        entries.push(entry);
    }
    Ok(entries)
}

fn parse_line(line: &str) -> Result<LutEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [index, channel, value] = fields.as_slice() else {
        bail!("expected 3 fields, got {}", fields.len());
    };

    let index: u8 = index.parse().context("invalid index")?;
    if index > 0x7F {
        bail!("index {} does not fit in a SysEx data byte", index);
    }
    let channel = match channel.to_ascii_lowercase().as_str() {
        "castor" | "0" => LutChannel::Castor,
        "pollux" | "1" => LutChannel::Pollux,
        other => return Err(anyhow!("unknown channel {:?}", other)),
    };
    let value = match value.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    }
    .context("invalid value")?;

    Ok(LutEntry { index, channel, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let text = "# castor table\n0 castor 100\n1 CASTOR 0x0fa0  # trailing comment\n\n0 1 65535\n";
        let entries = parse(text).unwrap();
        assert_eq!(
            entries,
            vec![
                LutEntry { index: 0, channel: LutChannel::Castor, value: 100 },
                LutEntry { index: 1, channel: LutChannel::Castor, value: 0x0FA0 },
                LutEntry { index: 0, channel: LutChannel::Pollux, value: 65535 },
            ]
        );
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = parse("0 castor 1\n1 castor\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));

        assert!(parse("0 left 1").is_err());
        assert!(parse("128 castor 1").is_err());
        assert!(parse("0 castor 65536").is_err());
    }
}
