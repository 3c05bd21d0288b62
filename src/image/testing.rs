// Fri Jan 16 2026 - Alex

//! Minimal PE32 writer for tests.

const PE_OFFSET: usize = 0x80;
const OPTIONAL_HEADER_SIZE: usize = 224;
const HEADERS_SIZE: usize = 0x400;
const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: u32 = 0x1000;

struct PendingSection {
    name: String,
    rva: u32,
    data: Vec<u8>,
    characteristics: u32,
}

pub struct Pe32Builder {
    image_base: u32,
    sections: Vec<PendingSection>,
}

impl Pe32Builder {
    pub fn new(image_base: u32) -> Self {
        Self { image_base, sections: Vec::new() }
    }

    pub fn section(mut self, name: &str, rva: u32, data: Vec<u8>, characteristics: u32) -> Self {
        self.sections.push(PendingSection { name: name.to_string(), rva, data, characteristics });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = vec![0u8; HEADERS_SIZE];
        out[0] = b'M';
        out[1] = b'Z';
        put_u32(&mut out, 0x3C, PE_OFFSET as u32);
        out[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");

        let coff = PE_OFFSET + 4;
        put_u16(&mut out, coff, 0x14C);
        put_u16(&mut out, coff + 2, self.sections.len() as u16);
        put_u16(&mut out, coff + 16, OPTIONAL_HEADER_SIZE as u16);
        put_u16(&mut out, coff + 18, 0x0102);

        let size_of_image = self
            .sections
            .iter()
            .map(|s| align(s.rva + s.data.len().max(1) as u32, SECTION_ALIGNMENT))
            .max()
            .unwrap_or(SECTION_ALIGNMENT);

        let opt = coff + 20;
        put_u16(&mut out, opt, 0x10B);
        put_u32(&mut out, opt + 16, self.sections.first().map(|s| s.rva).unwrap_or(0));
        put_u32(&mut out, opt + 28, self.image_base);
        put_u32(&mut out, opt + 32, SECTION_ALIGNMENT);
        put_u32(&mut out, opt + 36, FILE_ALIGNMENT as u32);
        put_u16(&mut out, opt + 40, 6);
        put_u16(&mut out, opt + 48, 6);
        put_u32(&mut out, opt + 56, size_of_image);
        put_u32(&mut out, opt + 60, HEADERS_SIZE as u32);
        put_u16(&mut out, opt + 68, 3);
        put_u32(&mut out, opt + 92, 16);

        let mut table = opt + OPTIONAL_HEADER_SIZE;
        let mut raw = HEADERS_SIZE;
        let mut body = Vec::new();
        for section in &self.sections {
            let name = section.name.as_bytes();
            let len = name.len().min(8);
            out[table..table + len].copy_from_slice(&name[..len]);
            put_u32(&mut out, table + 8, section.data.len() as u32);
            put_u32(&mut out, table + 12, section.rva);
            let raw_size = align(section.data.len() as u32, FILE_ALIGNMENT as u32);
            put_u32(&mut out, table + 16, raw_size);
            put_u32(&mut out, table + 20, raw as u32);
            put_u32(&mut out, table + 36, section.characteristics);

            let mut data = section.data.clone();
            data.resize(raw_size as usize, 0);
            body.extend_from_slice(&data);
            raw += raw_size as usize;
            table += 40;
        }

        out.extend_from_slice(&body);
        out
    }
}

fn align(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) / alignment * alignment
}

fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
