//! Gojūon grouping and name ordering for the directory view.

use crate::models::DirectoryEntry;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KanaRow {
    A,
    Ka,
    Sa,
    Ta,
    Na,
    Ha,
    Ma,
    Ya,
    Ra,
    Wa,
    Other,
}

const ROWS: [(KanaRow, &str); 10] = [
    (KanaRow::A, "あいうえおぁぃぅぇぉゔアイウエオァィゥェォヴ"),
    (KanaRow::Ka, "かきくけこがぎぐげごゕゖカキクケコガギグゲゴヵヶ"),
    (KanaRow::Sa, "さしすせそざじずぜぞサシスセソザジズゼゾ"),
    (KanaRow::Ta, "たちつてとだぢづでどっタチツテトダヂヅデドッ"),
    (KanaRow::Na, "なにぬねのナニヌネノ"),
    (KanaRow::Ha, "はひふへほばびぶべぼぱぴぷぺぽハヒフヘホバビブベボパピプペポ"),
    (KanaRow::Ma, "まみむめもマミムメモ"),
    (KanaRow::Ya, "やゆよゃゅょヤユヨャュョ"),
    (KanaRow::Ra, "らりるれろラリルレロ"),
    (KanaRow::Wa, "わゐゑをんゎワヰヱヲンヮヷヸヹヺ"),
];

impl KanaRow {
    /// Display order; `Other` always comes last.
    pub const ORDER: [KanaRow; 11] = [
        KanaRow::A,
        KanaRow::Ka,
        KanaRow::Sa,
        KanaRow::Ta,
        KanaRow::Na,
        KanaRow::Ha,
        KanaRow::Ma,
        KanaRow::Ya,
        KanaRow::Ra,
        KanaRow::Wa,
        KanaRow::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            KanaRow::A => "あ",
            KanaRow::Ka => "か",
            KanaRow::Sa => "さ",
            KanaRow::Ta => "た",
            KanaRow::Na => "な",
            KanaRow::Ha => "は",
            KanaRow::Ma => "ま",
            KanaRow::Ya => "や",
            KanaRow::Ra => "ら",
            KanaRow::Wa => "わ",
            KanaRow::Other => "その他",
        }
    }
}

pub fn kana_row(name: &str) -> KanaRow {
    let Some(first) = name.trim_start().chars().next() else {
        return KanaRow::Other;
    };
    ROWS.iter()
        .find(|(_, members)| members.contains(first))
        .map_or(KanaRow::Other, |(row, _)| *row)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanaGroup {
    pub row: KanaRow,
    pub label: &'static str,
    pub entries: Vec<DirectoryEntry>,
}

/// Buckets entries by initial sound, in display order, skipping empty rows.
pub fn group_by_kana(entries: &[DirectoryEntry]) -> Vec<KanaGroup> {
    KanaRow::ORDER
        .iter()
        .filter_map(|&row| {
            let mut members: Vec<DirectoryEntry> = entries
                .iter()
                .filter(|entry| kana_row(&entry.name) == row)
                .cloned()
                .collect();
            if members.is_empty() {
                return None;
            }
            members.sort_by(|a, b| collate(&a.name, &b.name));
            Some(KanaGroup {
                row,
                label: row.label(),
                entries: members,
            })
        })
        .collect()
}

/// Name ordering that treats katakana as hiragana, full-width ASCII as
/// half-width and ignores letter case; the raw text breaks remaining ties.
pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b)).then_with(|| a.cmp(b))
}

fn collation_key(name: &str) -> Vec<char> {
    name.trim()
        .chars()
        .map(|c| match c {
            'ァ'..='ヶ' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            '！'..='～' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn voiced_initials_share_their_row() {
        assert_eq!(kana_row("ばなな"), KanaRow::Ha);
        assert_eq!(kana_row("ぴーち"), KanaRow::Ha);
        assert_eq!(kana_row("ガーネット"), KanaRow::Ka);
        assert_eq!(kana_row("ヴィオラ"), KanaRow::A);
        assert_eq!(kana_row("ん"), KanaRow::Wa);
    }

    #[test]
    fn non_kana_initials_fall_into_other() {
        assert_eq!(kana_row("Alice"), KanaRow::Other);
        assert_eq!(kana_row("田中"), KanaRow::Other);
        assert_eq!(kana_row(""), KanaRow::Other);
        assert_eq!(KanaRow::Other.label(), "その他");
    }

    #[test]
    fn groups_follow_fixed_order_and_skip_empty_rows() {
        let entries = vec![
            entry("Zoe"),
            entry("らん"),
            entry("あやか"),
            entry("びび"),
            entry("アイ"),
            entry("はな"),
        ];
        let groups = group_by_kana(&entries);
        let labels: Vec<&str> = groups.iter().map(|group| group.label).collect();
        assert_eq!(labels, vec!["あ", "は", "ら", "その他"]);

        let a_names: Vec<&str> = groups[0].entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(a_names, vec!["アイ", "あやか"]);
        let ha_names: Vec<&str> = groups[1].entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(ha_names, vec!["はな", "びび"]);
    }

    #[test]
    fn collation_folds_katakana_and_width() {
        assert_eq!(collate("あい", "アイ"), Ordering::Less);
        assert_eq!(collate("アイ", "あう"), Ordering::Less);
        assert_eq!(collate("あい", "あう"), Ordering::Less);
        assert_eq!(collate("ＡＢＣ", "abd"), Ordering::Less);
        assert_eq!(collate("佐藤", "鈴木"), Ordering::Less);
    }

    #[test]
    fn empty_directory_has_no_groups() {
        assert!(group_by_kana(&[]).is_empty());
    }
}
