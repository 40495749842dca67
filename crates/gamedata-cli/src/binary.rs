//! Module images read from disk.
//!
//! ELF shared objects and PE DLLs are mapped segment by segment so that
//! pattern hits translate to the virtual address the loader would give them.
//! Dynamic symbols (ELF) and exports (PE) become the symbol table.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use gamedata::{Address, Module, find_pattern};
use goblin::Object;
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::section_header::SHN_UNDEF;
use tracing::debug;

/// A file range that is mapped at a virtual address
#[derive(Debug, Clone, Copy)]
struct Segment {
    file_offset: usize,
    file_size: usize,
    vaddr: u64,
}

pub struct BinaryModule {
    name: String,
    base: Address,
    data: Vec<u8>,
    segments: Vec<Segment>,
    symbols: HashMap<String, u64>,
}

impl BinaryModule {
    /// Whether `data` is an image format this module understands
    pub fn is_supported(data: &[u8]) -> bool {
        matches!(Object::parse(data), Ok(Object::Elf(_) | Object::PE(_)))
    }

    pub fn parse(name: String, data: Vec<u8>, base: Address) -> Result<Self> {
        let (segments, symbols) = match Object::parse(&data)
            .with_context(|| format!("Failed to parse {}", name))?
        {
            Object::Elf(elf) => {
                let segments = elf
                    .program_headers
                    .iter()
                    .filter(|ph| ph.p_type == PT_LOAD)
                    .map(|ph| Segment {
                        file_offset: ph.p_offset as usize,
                        file_size: ph.p_filesz as usize,
                        vaddr: ph.p_vaddr,
                    })
                    .collect();

                let symbols = elf
                    .dynsyms
                    .iter()
                    .filter(|sym| sym.st_shndx != SHN_UNDEF as usize && sym.st_value != 0)
                    .filter_map(|sym| {
                        let name = elf.dynstrtab.get_at(sym.st_name)?;
                        (!name.is_empty()).then(|| (name.to_string(), sym.st_value))
                    })
                    .collect();

                (segments, symbols)
            }
            Object::PE(pe) => {
                let segments = pe
                    .sections
                    .iter()
                    .map(|section| Segment {
                        file_offset: section.pointer_to_raw_data as usize,
                        file_size: section.size_of_raw_data as usize,
                        vaddr: u64::from(section.virtual_address),
                    })
                    .collect();

                let symbols = pe
                    .exports
                    .iter()
                    .filter_map(|export| Some((export.name?.to_string(), export.rva as u64)))
                    .collect();

                (segments, symbols)
            }
            _ => bail!("{} is not an ELF or PE image", name),
        };

        let module = Self {
            name,
            base,
            data,
            segments,
            symbols,
        };
        debug!(
            "Loaded {}: {} bytes, {} segments, {} symbols, base 0x{:X}",
            module.name,
            module.data.len(),
            module.segments.len(),
            module.symbols.len(),
            module.base
        );
        Ok(module)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    fn segment_bytes(&self, segment: &Segment) -> &[u8] {
        let start = segment.file_offset.min(self.data.len());
        let end = segment
            .file_offset
            .saturating_add(segment.file_size)
            .min(self.data.len());
        &self.data[start..end]
    }
}

impl Module for BinaryModule {
    fn is_loaded(&self) -> bool {
        true
    }

    fn find_pattern(&self, pattern: &[u8], wildcard: u8) -> Option<Address> {
        self.segments
            .iter()
            .filter_map(|segment| {
                let offset = find_pattern(self.segment_bytes(segment), pattern, wildcard)?;
                self.base
                    .checked_add(segment.vaddr)?
                    .checked_add(offset as u64)
            })
            .min()
    }

    fn resolve_symbol(&self, name: &str) -> Option<Address> {
        self.symbols
            .get(name)
            .and_then(|value| self.base.checked_add(*value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_unknown_format() {
        assert!(!BinaryModule::is_supported(&[0u8; 64]));
        let result = BinaryModule::parse("blob.bin".to_string(), vec![0u8; 64], 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_segment_translation() {
        let mut data = vec![0u8; 0x40];
        data[0x28..0x2B].copy_from_slice(&[0xAA, 0xBB, 0xCC]);
        let module = BinaryModule {
            name: "test".to_string(),
            base: 0x7000_0000,
            data,
            segments: vec![
                Segment {
                    file_offset: 0,
                    file_size: 0x20,
                    vaddr: 0,
                },
                Segment {
                    file_offset: 0x20,
                    file_size: 0x20,
                    vaddr: 0x1000,
                },
            ],
            symbols: HashMap::from([("Thing".to_string(), 0x1010)]),
        };

        assert_eq!(
            module.find_pattern(&[0xAA, 0x2A, 0xCC], 0x2A),
            Some(0x7000_1008)
        );
        assert_eq!(module.find_pattern(&[0xDD], 0x2A), None);
        assert_eq!(module.resolve_symbol("Thing"), Some(0x7000_1010));
        assert_eq!(module.resolve_symbol("Other"), None);
    }

    #[test]
    fn test_segment_bytes_clamped_to_file() {
        let module = BinaryModule {
            name: "short".to_string(),
            base: 0,
            data: vec![1, 2, 3],
            segments: vec![],
            symbols: HashMap::new(),
        };
        let segment = Segment {
            file_offset: 2,
            file_size: 100,
            vaddr: 0,
        };
        assert_eq!(module.segment_bytes(&segment), &[3]);
    }

    #[test]
    fn test_address_overflow_is_none() {
        let module = BinaryModule {
            name: "high".to_string(),
            base: u64::MAX - 0x10,
            data: vec![0xAA; 0x20],
            segments: vec![Segment {
                file_offset: 0,
                file_size: 0x20,
                vaddr: 0x1000,
            }],
            symbols: HashMap::from([("Thing".to_string(), 0x1000)]),
        };
        assert_eq!(module.find_pattern(&[0xAA], 0x2A), None);
        assert_eq!(module.resolve_symbol("Thing"), None);
    }

    fn put(data: &mut [u8], offset: usize, bytes: &[u8]) {
        data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Minimal ELF64 shared object.
    ///
    /// Headers, dynamic section, hash table, dynsym and dynstr live in a
    /// read-only segment mapped at its file offset; 0x200..0x240 is a text
    /// segment mapped at 0x1200. `Exported` is defined at 0x1210, where the
    /// text holds DE AD BE EF; `Imported` is undefined.
    fn elf_fixture() -> Vec<u8> {
        const PT_LOAD: u32 = 1;
        const PT_DYNAMIC: u32 = 2;
        const DT_NULL: u64 = 0;
        const DT_HASH: u64 = 4;
        const DT_STRTAB: u64 = 5;
        const DT_SYMTAB: u64 = 6;
        const DT_STRSZ: u64 = 10;
        const DT_SYMENT: u64 = 11;

        let mut data = vec![0u8; 0x240];

        // ELF header
        put(&mut data, 0, &[0x7F, b'E', b'L', b'F', 2, 1, 1]);
        put(&mut data, 16, &3u16.to_le_bytes()); // ET_DYN
        put(&mut data, 18, &62u16.to_le_bytes()); // EM_X86_64
        put(&mut data, 20, &1u32.to_le_bytes());
        put(&mut data, 32, &0x40u64.to_le_bytes()); // e_phoff
        put(&mut data, 52, &64u16.to_le_bytes()); // e_ehsize
        put(&mut data, 54, &56u16.to_le_bytes()); // e_phentsize
        put(&mut data, 56, &3u16.to_le_bytes()); // e_phnum
        put(&mut data, 58, &64u16.to_le_bytes()); // e_shentsize

        // program headers: type, flags, offset, vaddr, paddr, filesz, memsz, align
        let phdrs: [(u32, u32, u64, u64, u64); 3] = [
            (PT_LOAD, 4, 0, 0, 0x200),
            (PT_LOAD, 5, 0x200, 0x1200, 0x40),
            (PT_DYNAMIC, 4, 0x100, 0x100, 0x60),
        ];
        for (i, (p_type, flags, offset, vaddr, size)) in phdrs.into_iter().enumerate() {
            let at = 0x40 + i * 56;
            put(&mut data, at, &p_type.to_le_bytes());
            put(&mut data, at + 4, &flags.to_le_bytes());
            put(&mut data, at + 8, &offset.to_le_bytes());
            put(&mut data, at + 16, &vaddr.to_le_bytes());
            put(&mut data, at + 24, &vaddr.to_le_bytes());
            put(&mut data, at + 32, &size.to_le_bytes());
            put(&mut data, at + 40, &size.to_le_bytes());
            put(&mut data, at + 48, &0x10u64.to_le_bytes());
        }

        // dynamic section
        let dynamic = [
            (DT_HASH, 0x160),
            (DT_STRTAB, 0x1D0),
            (DT_SYMTAB, 0x180),
            (DT_STRSZ, 0x20),
            (DT_SYMENT, 24),
            (DT_NULL, 0),
        ];
        for (i, (tag, value)) in dynamic.into_iter().enumerate() {
            put(&mut data, 0x100 + i * 16, &tag.to_le_bytes());
            put(&mut data, 0x100 + i * 16 + 8, &u64::to_le_bytes(value));
        }

        // SysV hash: nbucket = 1, nchain = 3
        put(&mut data, 0x160, &1u32.to_le_bytes());
        put(&mut data, 0x164, &3u32.to_le_bytes());

        // dynsym: null, Exported (defined), Imported (undefined)
        let sym = 0x180 + 24;
        put(&mut data, sym, &1u32.to_le_bytes());
        put(&mut data, sym + 4, &[0x12, 0]); // STB_GLOBAL | STT_FUNC
        put(&mut data, sym + 6, &7u16.to_le_bytes());
        put(&mut data, sym + 8, &0x1210u64.to_le_bytes());
        put(&mut data, sym + 16, &4u64.to_le_bytes());
        let sym = 0x180 + 48;
        put(&mut data, sym, &10u32.to_le_bytes());
        put(&mut data, sym + 4, &[0x12, 0]);

        // dynstr
        put(&mut data, 0x1D0, b"\0Exported\0Imported\0");

        // text
        put(&mut data, 0x210, &[0xDE, 0xAD, 0xBE, 0xEF]);
        data
    }

    #[test]
    fn test_parse_elf_segments_and_dynsyms() {
        let data = elf_fixture();
        assert!(BinaryModule::is_supported(&data));

        let module = BinaryModule::parse("libfixture.so".to_string(), data, 0x7F00_0000).unwrap();
        assert_eq!(module.name(), "libfixture.so");
        assert_eq!(module.segments.len(), 2);
        assert_eq!(module.symbol_count(), 1);

        assert_eq!(module.resolve_symbol("Exported"), Some(0x7F00_1210));
        assert_eq!(module.resolve_symbol("Imported"), None);

        assert_eq!(
            module.find_pattern(&[0xDE, 0xAD, 0x2A, 0xEF], 0x2A),
            Some(0x7F00_1210)
        );
    }
}
