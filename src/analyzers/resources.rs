//! Resource directory walk for language anomaly indicators.
//!
//! The resource tree is three levels deep: type -> id -> language. Every
//! language-level leaf carries a LANGID in its name field. Offsets inside the
//! tree are relative to the start of the resource directory.

use goblin::pe::section_table::SectionTable;
use tracing::debug;

use super::language::{is_known_sublanguage, primary_language_name, split_langid};
use crate::error::{Result, TridentError};

const DIRECTORY_HEADER_SIZE: usize = 16;
const ENTRY_SIZE: usize = 8;
const SUBDIRECTORY_FLAG: u32 = 0x8000_0000;
/// Table headers plus entries read per file, over every level of the tree.
/// Crafted trees can reference one table from many entries.
const MAX_ENTRIES: usize = 65_536;

/// Indicator positions inside [`LanguageScan::flags`]
pub const LANG_ZERO: usize = 0;
pub const LANG_ABOVE_127: usize = 1;
pub const SUBLANG_ZERO: usize = 2;
pub const SUBLANG_TWO: usize = 3;

/// Outcome of the language walk: `Language=0, Language>127, SubLang=0, SubLang=2`
/// as 0/1, or -1 once an unknown code was seen.
#[derive(Debug, Default)]
pub struct LanguageScan {
    pub flags: [i64; 4],
    pub anomalies: Vec<TridentError>,
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Translate an RVA to a file offset using the section table
pub fn rva_to_offset(rva: u32, sections: &[SectionTable]) -> Option<usize> {
    sections.iter().find_map(|section| {
        let start = section.virtual_address;
        let span = section.virtual_size.max(section.size_of_raw_data);
        let end = start.checked_add(span)?;
        if rva >= start && rva < end {
            let delta = rva - start;
            Some(section.pointer_to_raw_data as usize + delta as usize)
        } else {
            None
        }
    })
}

/// Reader over one resource tree, charging every table against a shared budget
struct TreeWalk<'a> {
    data: &'a [u8],
    root: usize,
    budget: usize,
}

impl TreeWalk<'_> {
    /// `(name, offset_to_data)` pairs of one directory table
    fn entries(&mut self, relative: u32) -> Result<Vec<(u32, u32)>> {
        let root = self.root;
        let truncated = || {
            TridentError::missing_attribute(format!(
                "resource directory table at offset {:#x}",
                root as u64 + u64::from(relative)
            ))
        };

        let table = root.checked_add(relative as usize).ok_or_else(truncated)?;
        let named = read_u16(self.data, table + 12).ok_or_else(truncated)? as usize;
        let ids = read_u16(self.data, table + 14).ok_or_else(truncated)? as usize;

        let cost = 1 + named + ids;
        if cost > self.budget {
            return Err(TridentError::missing_attribute(
                "resource directory exceeds the entry budget",
            ));
        }
        self.budget -= cost;

        let first = table + DIRECTORY_HEADER_SIZE;
        (0..named + ids)
            .map(|i| {
                let entry = first + i * ENTRY_SIZE;
                let name = read_u32(self.data, entry).ok_or_else(truncated)?;
                let offset = read_u32(self.data, entry + 4).ok_or_else(truncated)?;
                Ok((name, offset))
            })
            .collect()
    }
}

/// Collect the LANGID of every language-level leaf under the directory at `root`.
///
/// Leaves found before a truncated table are kept in `ids`.
pub fn collect_language_ids(data: &[u8], root: usize, ids: &mut Vec<u32>) -> Result<()> {
    let mut walk = TreeWalk { data, root, budget: MAX_ENTRIES };
    for (_, type_offset) in walk.entries(0)? {
        if type_offset & SUBDIRECTORY_FLAG == 0 {
            continue;
        }
        for (_, id_offset) in walk.entries(type_offset & !SUBDIRECTORY_FLAG)? {
            if id_offset & SUBDIRECTORY_FLAG == 0 {
                continue;
            }
            let langs = walk.entries(id_offset & !SUBDIRECTORY_FLAG)?;
            // A fourth level is not part of the format; ignore it
            ids.extend(
                langs
                    .into_iter()
                    .filter(|(_, lang_offset)| lang_offset & SUBDIRECTORY_FLAG == 0)
                    .map(|(langid, _)| langid),
            );
        }
    }
    Ok(())
}

fn note_unknown(scan: &mut LanguageScan, what: &str, code: u16) {
    let seen = scan.anomalies.iter().any(|a| {
        matches!(a, TridentError::LookupFailure { what: w, code: c } if w == what && *c == u32::from(code))
    });
    if !seen {
        scan.anomalies.push(TridentError::lookup_failure(what, u32::from(code)));
    }
}

/// Fold LANGIDs into the four language indicators
pub fn language_flags(ids: &[u32]) -> LanguageScan {
    let mut scan = LanguageScan::default();

    for &langid in ids {
        let (primary, sub) = split_langid(langid);

        if primary_language_name(primary).is_some() {
            if primary == 0 && scan.flags[LANG_ZERO] != -1 {
                scan.flags[LANG_ZERO] = 1;
            }
            if primary > 127 && scan.flags[LANG_ABOVE_127] != -1 {
                scan.flags[LANG_ABOVE_127] = 1;
            }
        } else {
            scan.flags[LANG_ZERO] = -1;
            scan.flags[LANG_ABOVE_127] = -1;
            note_unknown(&mut scan, "language", primary);
        }

        if is_known_sublanguage(sub) {
            if sub == 0 && scan.flags[SUBLANG_ZERO] != -1 {
                scan.flags[SUBLANG_ZERO] = 1;
            }
            if sub == 2 && scan.flags[SUBLANG_TWO] != -1 {
                scan.flags[SUBLANG_TWO] = 1;
            }
        } else {
            scan.flags[SUBLANG_ZERO] = -1;
            scan.flags[SUBLANG_TWO] = -1;
            note_unknown(&mut scan, "sub-language", sub);
        }
    }

    scan
}

/// Walk the resource directory at `rva` (if any) and compute the language indicators
pub fn scan_languages(data: &[u8], rva: u32, sections: &[SectionTable]) -> LanguageScan {
    if rva == 0 {
        return LanguageScan::default();
    }

    let Some(root) = rva_to_offset(rva, sections) else {
        let mut scan = LanguageScan::default();
        scan.anomalies.push(TridentError::missing_attribute(format!(
            "resource directory at RVA {rva:#x} is outside every section"
        )));
        return scan;
    };

    let mut ids = Vec::new();
    let walk = collect_language_ids(data, root, &mut ids);
    let mut scan = language_flags(&ids);
    if let Err(e) = walk {
        debug!("Resource walk stopped early: {}", e);
        scan.anomalies.push(e);
    }
    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a resource tree with one type, one id and the given LANGIDs
    fn resource_tree(langids: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        let dir = |out: &mut Vec<u8>, ids: u16| {
            out.extend_from_slice(&[0u8; 12]);
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&ids.to_le_bytes());
        };

        // type directory at 0, one entry pointing at id directory (24)
        dir(&mut out, 1);
        out.extend_from_slice(&3u32.to_le_bytes());
        out.extend_from_slice(&(SUBDIRECTORY_FLAG | 24).to_le_bytes());

        // id directory at 24, one entry pointing at language directory (48)
        dir(&mut out, 1);
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(SUBDIRECTORY_FLAG | 48).to_le_bytes());

        // language directory at 48
        dir(&mut out, langids.len() as u16);
        for &id in langids {
            out.extend_from_slice(&id.to_le_bytes());
            out.extend_from_slice(&0x100u32.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_collects_langids() {
        let tree = resource_tree(&[0x0409, 0x0000]);
        let mut ids = Vec::new();
        collect_language_ids(&tree, 0, &mut ids).unwrap();
        assert_eq!(ids, vec![0x0409, 0x0000]);
    }

    #[test]
    fn test_walk_respects_root_offset() {
        let mut data = vec![0xccu8; 32];
        data.extend(resource_tree(&[0x0804]));
        let mut ids = Vec::new();
        collect_language_ids(&data, 32, &mut ids).unwrap();
        assert_eq!(ids, vec![0x0804]);
    }

    #[test]
    fn test_truncated_tree_is_reported() {
        let mut tree = resource_tree(&[0x0409, 0x0407]);
        // Cut the second language entry in half
        tree.truncate(tree.len() - 4);
        let mut ids = Vec::new();
        let err = collect_language_ids(&tree, 0, &mut ids).unwrap_err();
        assert!(matches!(err, TridentError::MissingAttribute { .. }));
        assert!(ids.is_empty());
    }

    #[test]
    fn test_shared_table_fan_out_is_bounded() {
        // 1000 type entries all pointing at one id table of 1000 leaves
        let n = 1000u16;
        let id_table = 16 + 8 * u32::from(n);
        let mut tree = Vec::new();
        for count in [n, n] {
            tree.extend_from_slice(&[0u8; 14]);
            tree.extend_from_slice(&count.to_le_bytes());
            let target = if tree.len() == 16 { SUBDIRECTORY_FLAG | id_table } else { 0x10 };
            for i in 0..u32::from(count) {
                tree.extend_from_slice(&i.to_le_bytes());
                tree.extend_from_slice(&target.to_le_bytes());
            }
        }

        let started = std::time::Instant::now();
        let mut ids = Vec::new();
        let err = collect_language_ids(&tree, 0, &mut ids).unwrap_err();
        assert!(matches!(err, TridentError::MissingAttribute { .. }));
        assert!(err.to_string().contains("entry budget"));
        assert!(ids.is_empty());
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_english_us_sets_nothing() {
        let scan = language_flags(&[0x0409]);
        assert_eq!(scan.flags, [0, 0, 0, 0]);
        assert!(scan.anomalies.is_empty());
    }

    #[test]
    fn test_neutral_language_flags() {
        let scan = language_flags(&[0x0000]);
        assert_eq!(scan.flags, [1, 0, 1, 0]);
    }

    #[test]
    fn test_sublanguage_two_and_high_primary() {
        // Chinese simplified (sub 2) and Breton (0x93)
        let scan = language_flags(&[0x0804, 0x0493]);
        assert_eq!(scan.flags, [0, 1, 0, 1]);
    }

    #[test]
    fn test_unknown_primary_is_sticky() {
        // 0x3d is unassigned; a later neutral entry must not clear the sentinel
        let scan = language_flags(&[0x043d, 0x0000]);
        assert_eq!(scan.flags[LANG_ZERO], -1);
        assert_eq!(scan.flags[LANG_ABOVE_127], -1);
        assert_eq!(scan.flags[SUBLANG_ZERO], 1);
        assert_eq!(scan.anomalies.len(), 1);
    }

    #[test]
    fn test_unknown_sublanguage() {
        // sub-language 0x20 on English
        let scan = language_flags(&[(0x20 << 10) | 0x09, (0x20 << 10) | 0x09]);
        assert_eq!(scan.flags, [0, 0, -1, -1]);
        assert_eq!(scan.anomalies.len(), 1);
    }

    #[test]
    fn test_rva_translation() {
        let section = SectionTable {
            virtual_address: 0x3000,
            virtual_size: 0x100,
            size_of_raw_data: 0x200,
            pointer_to_raw_data: 0x600,
            ..Default::default()
        };
        assert_eq!(rva_to_offset(0x3010, &[section.clone()]), Some(0x610));
        assert_eq!(rva_to_offset(0x31ff, &[section.clone()]), Some(0x7ff));
        assert_eq!(rva_to_offset(0x3200, &[section]), None);
    }

    #[test]
    fn test_resource_outside_sections() {
        let scan = scan_languages(&[0u8; 64], 0x9000, &[]);
        assert_eq!(scan.flags, [0, 0, 0, 0]);
        assert_eq!(scan.anomalies.len(), 1);
    }
}
