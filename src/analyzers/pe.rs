//! PE (Portable Executable) header feature extraction for Windows binaries.

use crate::analyzers::resources::scan_languages;
use crate::analyzers::Analyzer;
use crate::config::ScanConfig;
use crate::entropy::{calculate_entropy, EntropyLevel};
use crate::error::{Result, TridentError};
use crate::types::{pe_schema, FeatureRecord, Label, Schema};
use chrono::{DateTime, Datelike, Utc};
use goblin::pe::section_table::SectionTable;
use goblin::pe::PE;
use tracing::debug;

// COFF characteristics bits
const IMAGE_FILE_RELOCS_STRIPPED: u16 = 0x0001;
const IMAGE_FILE_LINE_NUMS_STRIPPED: u16 = 0x0004;
const IMAGE_FILE_LOCAL_SYMS_STRIPPED: u16 = 0x0008;
const IMAGE_FILE_BYTES_REVERSED_LO: u16 = 0x0080;
const IMAGE_FILE_BYTES_REVERSED_HI: u16 = 0x8000;

/// Optional header magic of PE32+ images, which have no BaseOfData field
const PE32_PLUS_MAGIC: u16 = 0x20b;

/// Sentinel written for absent or unknown values
pub const SENTINEL: i64 = -1;

/// Section properties OR-ed over every section of an image
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectionIndicators {
    pub raw_size_zero: bool,
    pub virtual_less_than_raw: bool,
    pub virtual_way_greater_than_raw: bool,
    pub relocations: bool,
    pub line_numbers: bool,
    pub pointer_to_raw_zero: bool,
    pub pointer_to_relocations: bool,
    pub pointer_to_line_numbers: bool,
    pub low_entropy: bool,
    pub high_entropy: bool,
    /// Raw size of the last `.rsrc` section, if any
    pub rsrc_size: Option<u32>,
}

impl SectionIndicators {
    pub fn from_sections(sections: &[SectionTable], data: &[u8], config: &ScanConfig) -> Self {
        let mut ind = Self::default();

        for section in sections {
            let raw = section.size_of_raw_data;
            let virt = section.virtual_size;

            ind.raw_size_zero |= raw == 0;
            ind.virtual_less_than_raw |= virt < raw;
            ind.virtual_way_greater_than_raw |=
                raw == 0 || u64::from(virt) > u64::from(raw) * config.virtual_raw_ratio;
            ind.relocations |= section.number_of_relocations != 0;
            ind.line_numbers |= section.number_of_linenumbers != 0;
            ind.pointer_to_raw_zero |= section.pointer_to_raw_data == 0;
            ind.pointer_to_relocations |= section.pointer_to_relocations != 0;
            ind.pointer_to_line_numbers |= section.pointer_to_linenumbers != 0;

            let entropy = calculate_entropy(section_bytes(section, data));
            match EntropyLevel::with_thresholds(entropy, config.low_entropy, config.high_entropy) {
                EntropyLevel::Low => ind.low_entropy = true,
                EntropyLevel::High => ind.high_entropy = true,
                EntropyLevel::Normal => {}
            }

            let name = String::from_utf8_lossy(&section.name);
            if name.contains(".rsrc") {
                ind.rsrc_size = Some(raw);
            }
        }

        ind
    }
}

/// Raw bytes of a section, clipped to the file
fn section_bytes<'a>(section: &SectionTable, data: &'a [u8]) -> &'a [u8] {
    let start = section.pointer_to_raw_data as usize;
    if start >= data.len() {
        return &[];
    }
    let end = start
        .saturating_add(section.size_of_raw_data as usize)
        .min(data.len());
    &data[start..end]
}

fn flag(value: bool) -> i64 {
    i64::from(value)
}

/// UTC year of a COFF timestamp
fn timestamp_year(timestamp: u32) -> i64 {
    DateTime::<Utc>::from_timestamp(i64::from(timestamp), 0)
        .map(|dt| i64::from(dt.year()))
        .unwrap_or(1970)
}

/// Extractor for the fixed PE header feature schema
pub struct PeAnalyzer {
    config: ScanConfig,
}

impl PeAnalyzer {
    /// Creates a new PE analyzer with default thresholds
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Extract the feature record of an in-memory image. `data` must be the
    /// whole file: its length is written into the `sample size` column.
    pub fn extract_bytes(&self, name: &str, data: &[u8], label: Label) -> Result<FeatureRecord> {
        let pe = PE::parse(data).map_err(|e| TridentError::malformed_input(name, e.to_string()))?;

        let coff = &pe.header.coff_header;
        let optional = pe
            .header
            .optional_header
            .as_ref()
            .ok_or_else(|| TridentError::malformed_input(name, "image has no optional header"))?;
        let standard = &optional.standard_fields;
        let windows = &optional.windows_fields;

        let mut record = FeatureRecord::new(name, label, Vec::with_capacity(45));

        let base_of_data = if standard.magic == PE32_PLUS_MAGIC {
            record.note(TridentError::missing_attribute("BaseOfData"));
            SENTINEL
        } else {
            standard.base_of_data as i64
        };

        let sections = SectionIndicators::from_sections(&pe.sections, data, &self.config);

        let resource_rva = match optional.data_directories.get_resource_table() {
            Some(dir) => dir.virtual_address,
            None => 0,
        };
        let languages = scan_languages(data, resource_rva, &pe.sections);
        let language_flags = languages.flags;
        for anomaly in languages.anomalies {
            record.note(anomaly);
        }

        let ch = coff.characteristics;
        record.features = vec![
            i64::from(coff.number_of_sections),
            timestamp_year(coff.time_date_stamp),
            i64::from(coff.pointer_to_symbol_table),
            i64::from(coff.number_of_symbol_table),
            flag(ch & IMAGE_FILE_BYTES_REVERSED_LO != 0),
            flag(ch & IMAGE_FILE_BYTES_REVERSED_HI != 0),
            flag(ch & IMAGE_FILE_RELOCS_STRIPPED != 0),
            flag(ch & IMAGE_FILE_LOCAL_SYMS_STRIPPED != 0),
            flag(ch & IMAGE_FILE_LINE_NUMS_STRIPPED != 0),
            i64::from(standard.major_linker_version),
            i64::from(standard.minor_linker_version),
            i64::from(windows.major_operating_system_version),
            i64::from(windows.minor_operating_system_version),
            i64::from(windows.major_image_version),
            i64::from(windows.minor_image_version),
            standard.size_of_code as i64,
            standard.size_of_initialized_data as i64,
            windows.size_of_image as i64,
            windows.size_of_headers as i64,
            windows.size_of_stack_reserve as i64,
            windows.size_of_stack_commit as i64,
            windows.size_of_heap_reserve as i64,
            windows.size_of_heap_commit as i64,
            standard.address_of_entry_point as i64,
            standard.base_of_code as i64,
            base_of_data,
            windows.win32_version_value as i64,
            windows.loader_flags as i64,
            windows.number_of_rva_and_sizes as i64,
            flag(sections.raw_size_zero),
            flag(sections.virtual_less_than_raw),
            flag(sections.virtual_way_greater_than_raw),
            flag(sections.relocations),
            flag(sections.line_numbers),
            flag(sections.pointer_to_raw_zero),
            flag(sections.pointer_to_relocations),
            flag(sections.pointer_to_line_numbers),
            flag(sections.low_entropy),
            flag(sections.high_entropy),
            language_flags[0],
            language_flags[1],
            language_flags[2],
            language_flags[3],
            sections.rsrc_size.map_or(SENTINEL, i64::from),
            data.len() as i64,
        ];

        if record.raised_exception {
            for anomaly in &record.anomalies {
                debug!("{}: {}", name, anomaly);
            }
        }

        Ok(record)
    }
}

impl Default for PeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for PeAnalyzer {
    fn schema(&self) -> Schema {
        pe_schema()
    }

    fn extract(&self, name: &str, data: &[u8], label: Label) -> Result<FeatureRecord> {
        self.extract_bytes(name, data, label)
    }

    fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &[u8], virt: u32, raw: u32, ptr: u32) -> SectionTable {
        let mut n = [0u8; 8];
        n[..name.len()].copy_from_slice(name);
        SectionTable {
            name: n,
            virtual_size: virt,
            size_of_raw_data: raw,
            pointer_to_raw_data: ptr,
            ..Default::default()
        }
    }

    #[test]
    fn test_indicators_are_or_aggregated() {
        let data = vec![0u8; 0x400];
        let sections = vec![
            section(b".text", 0x100, 0x200, 0x200),
            section(b".bss", 0x1000, 0, 0),
        ];
        let ind = SectionIndicators::from_sections(&sections, &data, &ScanConfig::default());
        assert!(ind.raw_size_zero);
        assert!(ind.virtual_less_than_raw);
        assert!(ind.virtual_way_greater_than_raw);
        assert!(ind.pointer_to_raw_zero);
        assert!(!ind.relocations);
        assert!(ind.low_entropy);
        assert!(!ind.high_entropy);
        assert_eq!(ind.rsrc_size, None);
    }

    #[test]
    fn test_virtual_ratio_boundary() {
        let data = vec![0u8; 0x400];
        let config = ScanConfig::default();
        // exactly ten times is not "way greater"
        let at = SectionIndicators::from_sections(&[section(b".a", 1000, 100, 0x200)], &data, &config);
        assert!(!at.virtual_way_greater_than_raw);
        let above = SectionIndicators::from_sections(&[section(b".a", 1001, 100, 0x200)], &data, &config);
        assert!(above.virtual_way_greater_than_raw);
    }

    #[test]
    fn test_high_entropy_and_rsrc() {
        let mut data = vec![0u8; 0x200];
        data.extend((0..=255u8).cycle().take(0x200));
        let sections = vec![section(b".rsrc", 0x200, 0x200, 0x200)];
        let ind = SectionIndicators::from_sections(&sections, &data, &ScanConfig::default());
        assert!(ind.high_entropy);
        assert!(!ind.low_entropy);
        assert_eq!(ind.rsrc_size, Some(0x200));
    }

    #[test]
    fn test_section_bytes_clipped() {
        let data = vec![1u8; 0x300];
        assert_eq!(section_bytes(&section(b".a", 0, 0x200, 0x200), &data).len(), 0x100);
        assert!(section_bytes(&section(b".a", 0, 0x200, 0x400), &data).is_empty());
    }

    #[test]
    fn test_timestamp_year() {
        assert_eq!(timestamp_year(0), 1970);
        // 2013-04-23T00:00:00Z
        assert_eq!(timestamp_year(1_366_675_200), 2013);
    }

    #[test]
    fn test_rejects_non_pe() {
        let analyzer = PeAnalyzer::new();
        let err = analyzer
            .extract_bytes("notes.txt", b"just some text", Label::Clean)
            .unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().starts_with("notes.txt is not a pefile"));
    }
}
