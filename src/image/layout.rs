// Fri Jan 16 2026 - Alex

use crate::image::ImageError;
use crate::memory::{Module, Protection, TargetMemory};
use goblin::pe::header::Header;
use std::collections::BTreeMap;

const MACHINE_I386: u16 = 0x14C;
const MAGIC_PE32: u16 = 0x10B;
const SIZEOF_PE_SIGNATURE: usize = 4;
const SIZEOF_COFF_HEADER: usize = 20;
const HEADER_PAGE: u32 = 0x1000;

const SCN_MEM_EXECUTE: u32 = 0x2000_0000;
const SCN_MEM_READ: u32 = 0x4000_0000;
const SCN_MEM_WRITE: u32 = 0x8000_0000;

/// One entry of the section table. Addresses are RVAs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub virtual_address: u32,
    pub virtual_size: u32,
    pub raw_offset: u32,
    pub raw_size: u32,
    pub characteristics: u32,
}

impl Section {
    pub fn protection(&self) -> Protection {
        Protection::from_rwx(
            self.characteristics & SCN_MEM_READ != 0,
            self.characteristics & SCN_MEM_WRITE != 0,
            self.characteristics & SCN_MEM_EXECUTE != 0,
        )
    }

    pub fn contains_rva(&self, rva: u32) -> bool {
        rva >= self.virtual_address && (rva as u64) < self.virtual_address as u64 + self.virtual_size as u64
    }
}

/// Header-level layout of a 32-bit PE image.
#[derive(Debug, Clone)]
pub struct ImageLayout {
    pub image_base: u32,
    pub size_of_image: u32,
    pub size_of_headers: u32,
    pub section_alignment: u32,
    pub entry_point: u32,
    sections: BTreeMap<String, Section>,
    order: Vec<String>,
}

impl ImageLayout {
    /// Parses the headers and section table from the start of an image.
    pub fn parse(bytes: &[u8]) -> Result<Self, ImageError> {
        let header = Header::parse(bytes)?;

        if header.coff_header.machine != MACHINE_I386 {
            return Err(ImageError::UnsupportedMachine(header.coff_header.machine));
        }

        let optional = header.optional_header.ok_or(ImageError::NotPe32)?;
        if optional.standard_fields.magic != MAGIC_PE32 {
            return Err(ImageError::NotPe32);
        }

        let mut offset = header.dos_header.pe_pointer as usize
            + SIZEOF_PE_SIGNATURE
            + SIZEOF_COFF_HEADER
            + header.coff_header.size_of_optional_header as usize;
        let tables = header.coff_header.sections(bytes, &mut offset)?;

        let mut sections = BTreeMap::new();
        let mut order = Vec::with_capacity(tables.len());
        for table in &tables {
            let name = match &table.real_name {
                Some(real) => real.clone(),
                None => String::from_utf8_lossy(&table.name).trim_end_matches('\0').to_string(),
            };
            let section = Section {
                name: name.clone(),
                virtual_address: table.virtual_address,
                virtual_size: table.virtual_size,
                raw_offset: table.pointer_to_raw_data,
                raw_size: table.size_of_raw_data,
                characteristics: table.characteristics,
            };
            // first section wins on duplicate names
            if !sections.contains_key(&name) {
                order.push(name.clone());
                sections.insert(name, section);
            }
        }

        Ok(Self {
            image_base: optional.windows_fields.image_base as u32,
            size_of_image: optional.windows_fields.size_of_image as u32,
            size_of_headers: optional.windows_fields.size_of_headers as u32,
            section_alignment: optional.windows_fields.section_alignment as u32,
            entry_point: optional.standard_fields.address_of_entry_point as u32,
            sections,
            order,
        })
    }

    /// Reads and parses the headers of a module mapped in `target`.
    pub fn read(target: &dyn TargetMemory, module: &Module) -> Result<Self, ImageError> {
        let first = HEADER_PAGE.min(module.size.max(1));
        let bytes = target.read_bytes(module.base, first as usize)?;
        let layout = Self::parse(&bytes)?;

        if layout.size_of_headers > first && layout.size_of_headers <= module.size {
            log::debug!("re-reading 0x{:X} header bytes of {}", layout.size_of_headers, module);
            let bytes = target.read_bytes(module.base, layout.size_of_headers as usize)?;
            return Self::parse(&bytes);
        }

        Ok(layout)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Sections in section-table order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.order.iter().filter_map(move |name| self.sections.get(name))
    }

    pub fn section_for_rva(&self, rva: u32) -> Option<&Section> {
        self.sections().find(|s| s.contains_rva(rva))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::testing::Pe32Builder;

    #[test]
    fn test_parse_sections() {
        let image = Pe32Builder::new(0x400000)
            .section(".text", 0x1000, vec![0xCC; 0x200], SCN_MEM_READ | SCN_MEM_EXECUTE)
            .section(".rdata", 0x2000, b"hello\0".to_vec(), SCN_MEM_READ)
            .section(".data", 0x3000, vec![0; 0x10], SCN_MEM_READ | SCN_MEM_WRITE)
            .build();

        let layout = ImageLayout::parse(&image).unwrap();
        assert_eq!(layout.image_base, 0x400000);
        assert_eq!(layout.size_of_image, 0x4000);

        let rdata = layout.section(".rdata").unwrap();
        assert_eq!(rdata.virtual_address, 0x2000);
        assert_eq!(rdata.protection(), Protection::READONLY);
        assert_eq!(layout.section(".text").unwrap().protection(), Protection::EXECUTE_READ);
        assert!(layout.section(".bss").is_none());

        let names: Vec<_> = layout.sections().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![".text", ".rdata", ".data"]);
        assert_eq!(layout.section_for_rva(0x3004).unwrap().name, ".data");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(ImageLayout::parse(&[0u8; 0x200]).is_err());
    }

    #[test]
    fn test_rejects_other_machines() {
        let mut image = Pe32Builder::new(0x400000)
            .section(".text", 0x1000, vec![0xC3], SCN_MEM_READ | SCN_MEM_EXECUTE)
            .build();
        // COFF machine field follows the PE signature
        image[0x84] = 0x64;
        image[0x85] = 0x86;
        assert!(matches!(ImageLayout::parse(&image), Err(ImageError::UnsupportedMachine(0x8664))));
    }
}
