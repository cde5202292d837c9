//! Builder for small, well-formed PE images used by the integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const FILE_ALIGNMENT: usize = 0x200;
pub const SECTION_ALIGNMENT: u32 = 0x1000;
const E_LFANEW: usize = 0x80;
const DATA_DIRECTORIES: usize = 16;
const RESOURCE_DIRECTORY: usize = 2;
/// RT_STRING
const RESOURCE_TYPE: u32 = 6;

/// 2013-04-23T00:00:00Z
pub const TIMESTAMP_2013: u32 = 1_366_675_200;

pub struct Section {
    pub name: &'static str,
    pub data: Vec<u8>,
    pub virtual_size: Option<u32>,
    pub number_of_relocations: u16,
}

impl Section {
    pub fn new(name: &'static str, data: Vec<u8>) -> Self {
        Self { name, data, virtual_size: None, number_of_relocations: 0 }
    }
}

/// 0x200 bytes cycling through 31 values (entropy ~4.95)
pub fn code_bytes() -> Vec<u8> {
    (0..FILE_ALIGNMENT).map(|i| (i * 7 % 31) as u8 + 0x40).collect()
}

pub struct PeBuilder {
    pe32_plus: bool,
    timestamp: u32,
    characteristics: u16,
    linker_version: (u8, u8),
    base_of_data: u32,
    sections: Vec<Section>,
    langids: Option<Vec<u32>>,
    claimed_languages: Option<u16>,
}

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, v: u64) {
    buf[at..at + 8].copy_from_slice(&v.to_le_bytes());
}

fn align(n: usize, to: usize) -> usize {
    n.div_ceil(to) * to
}

/// Resource tree with one type, one id and one language entry per LANGID,
/// laid out for a section mapped at `rva`
pub fn resource_section(langids: &[u32], rva: u32) -> Vec<u8> {
    let lang_dir = 48usize;
    let data_entry = lang_dir + 16 + 8 * langids.len();
    let payload = data_entry + 16;
    let mut out = vec![0u8; payload + 4];

    // type directory -> id directory
    put_u16(&mut out, 14, 1);
    put_u32(&mut out, 16, RESOURCE_TYPE);
    put_u32(&mut out, 20, 0x8000_0000 | 24);
    // id directory -> language directory
    put_u16(&mut out, 24 + 14, 1);
    put_u32(&mut out, 40, 1);
    put_u32(&mut out, 44, 0x8000_0000 | lang_dir as u32);
    // language directory -> shared data entry
    put_u16(&mut out, lang_dir + 14, langids.len() as u16);
    for (i, &id) in langids.iter().enumerate() {
        let entry = lang_dir + 16 + 8 * i;
        put_u32(&mut out, entry, id);
        put_u32(&mut out, entry + 4, data_entry as u32);
    }
    put_u32(&mut out, data_entry, rva + payload as u32);
    put_u32(&mut out, data_entry + 4, 4);
    out[payload..payload + 4].copy_from_slice(b"abcd");
    out
}

impl PeBuilder {
    pub fn pe32() -> Self {
        Self {
            pe32_plus: false,
            timestamp: TIMESTAMP_2013,
            // EXECUTABLE_IMAGE | 32BIT_MACHINE
            characteristics: 0x0102,
            linker_version: (9, 0),
            base_of_data: 0x2000,
            sections: Vec::new(),
            langids: None,
            claimed_languages: None,
        }
    }

    pub fn pe32_plus() -> Self {
        Self { pe32_plus: true, characteristics: 0x0022, ..Self::pe32() }
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn characteristics(mut self, characteristics: u16) -> Self {
        self.characteristics = characteristics;
        self
    }

    pub fn linker_version(mut self, major: u8, minor: u8) -> Self {
        self.linker_version = (major, minor);
        self
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Append a `.rsrc` section holding one language entry per LANGID
    pub fn resources(mut self, langids: &[u32]) -> Self {
        self.langids = Some(langids.to_vec());
        self
    }

    /// Declare `count` language entries while writing only the real ones, so
    /// the language table runs past the end of the file
    pub fn claimed_languages(mut self, count: u16) -> Self {
        self.claimed_languages = Some(count);
        self
    }

    fn optional_header_size(&self) -> usize {
        if self.pe32_plus {
            24 + 88 + DATA_DIRECTORIES * 8
        } else {
            28 + 68 + DATA_DIRECTORIES * 8
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut sections: Vec<Section> = if self.sections.is_empty() {
            vec![Section::new(".text", code_bytes())]
        } else {
            self.sections
                .iter()
                .map(|s| Section {
                    name: s.name,
                    data: s.data.clone(),
                    virtual_size: s.virtual_size,
                    number_of_relocations: s.number_of_relocations,
                })
                .collect()
        };

        // (virtual address, raw pointer, raw size) per section
        let mut layout = Vec::new();
        let mut rva = SECTION_ALIGNMENT;
        let mut raw = FILE_ALIGNMENT;
        let mut resource_rva = None;
        let section_count = sections.len() + usize::from(self.langids.is_some());
        for i in 0..section_count {
            if i == sections.len() {
                let langids = self.langids.as_deref().unwrap_or_default();
                let mut data = resource_section(langids, rva);
                if let Some(count) = self.claimed_languages {
                    put_u16(&mut data, 48 + 14, count);
                }
                data.resize(align(data.len(), FILE_ALIGNMENT), 0);
                let size = data.len() as u32;
                sections.push(Section { virtual_size: Some(size), ..Section::new(".rsrc", data) });
                resource_rva = Some(rva);
            }
            let raw_size = align(sections[i].data.len(), FILE_ALIGNMENT);
            layout.push((rva, raw, raw_size));
            rva += align(raw_size.max(1), SECTION_ALIGNMENT as usize) as u32;
            raw += raw_size;
        }
        let size_of_image = rva;

        let mut buf = vec![0u8; raw];
        buf[0..2].copy_from_slice(b"MZ");
        put_u32(&mut buf, 0x3c, E_LFANEW as u32);
        buf[E_LFANEW..E_LFANEW + 4].copy_from_slice(b"PE\0\0");

        let coff = E_LFANEW + 4;
        let machine: u16 = if self.pe32_plus { 0x8664 } else { 0x14c };
        put_u16(&mut buf, coff, machine);
        put_u16(&mut buf, coff + 2, sections.len() as u16);
        put_u32(&mut buf, coff + 4, self.timestamp);
        put_u16(&mut buf, coff + 16, self.optional_header_size() as u16);
        put_u16(&mut buf, coff + 18, self.characteristics);

        let opt = coff + 20;
        let code_size: u32 = layout.first().map_or(0, |l| l.2 as u32);
        put_u16(&mut buf, opt, if self.pe32_plus { 0x20b } else { 0x10b });
        buf[opt + 2] = self.linker_version.0;
        buf[opt + 3] = self.linker_version.1;
        put_u32(&mut buf, opt + 4, code_size);
        put_u32(&mut buf, opt + 8, 0x400);
        // Entry point and code base at the first section
        put_u32(&mut buf, opt + 16, SECTION_ALIGNMENT);
        put_u32(&mut buf, opt + 20, SECTION_ALIGNMENT);

        let (windows, dirs) = if self.pe32_plus {
            let w = opt + 24;
            put_u64(&mut buf, w, 0x1_4000_0000);
            (w, w + 88)
        } else {
            put_u32(&mut buf, opt + 24, self.base_of_data);
            let w = opt + 28;
            put_u32(&mut buf, w, 0x40_0000);
            (w, w + 68)
        };
        // Offsets below are relative to the windows fields and differ by the
        // width of ImageBase
        let wide = if self.pe32_plus { 4 } else { 0 };
        put_u32(&mut buf, windows + wide + 4, SECTION_ALIGNMENT);
        put_u32(&mut buf, windows + wide + 8, FILE_ALIGNMENT as u32);
        put_u16(&mut buf, windows + wide + 12, 6); // MajorOperatingSystemVersion
        put_u16(&mut buf, windows + wide + 14, 1);
        put_u16(&mut buf, windows + wide + 16, 2); // MajorImageVersion
        put_u16(&mut buf, windows + wide + 18, 3);
        put_u16(&mut buf, windows + wide + 20, 6); // MajorSubsystemVersion
        put_u32(&mut buf, windows + wide + 28, size_of_image);
        put_u32(&mut buf, windows + wide + 32, FILE_ALIGNMENT as u32);
        put_u16(&mut buf, windows + wide + 40, 2); // Subsystem: GUI
        if self.pe32_plus {
            let sizes = windows + 48;
            put_u64(&mut buf, sizes, 0x10_0000);
            put_u64(&mut buf, sizes + 8, 0x1000);
            put_u64(&mut buf, sizes + 16, 0x10_0000);
            put_u64(&mut buf, sizes + 24, 0x1000);
            put_u32(&mut buf, windows + 84, DATA_DIRECTORIES as u32);
        } else {
            put_u32(&mut buf, windows + 44, 0x10_0000);
            put_u32(&mut buf, windows + 48, 0x1000);
            put_u32(&mut buf, windows + 52, 0x10_0000);
            put_u32(&mut buf, windows + 56, 0x1000);
            put_u32(&mut buf, windows + 64, DATA_DIRECTORIES as u32);
        }
        if let Some(rva) = resource_rva {
            let at = dirs + RESOURCE_DIRECTORY * 8;
            put_u32(&mut buf, at, rva);
            put_u32(&mut buf, at + 4, sections.last().map_or(0, |s| s.data.len() as u32));
        }

        let table = opt + self.optional_header_size();
        for (i, (section, &(va, ptr, raw_size))) in sections.iter().zip(&layout).enumerate() {
            let h = table + i * 40;
            let name = section.name.as_bytes();
            buf[h..h + name.len()].copy_from_slice(name);
            put_u32(&mut buf, h + 8, section.virtual_size.unwrap_or(section.data.len() as u32));
            put_u32(&mut buf, h + 12, va);
            put_u32(&mut buf, h + 16, raw_size as u32);
            put_u32(&mut buf, h + 20, if raw_size == 0 { 0 } else { ptr as u32 });
            put_u16(&mut buf, h + 32, section.number_of_relocations);
            put_u32(&mut buf, h + 36, 0x4000_0040);
            buf[ptr..ptr + section.data.len()].copy_from_slice(&section.data);
        }

        buf
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}
