//! Factory methods for PE images.
//!
//! [`TestImage`] lays out a small library by hand: one `.text` section holding the CLI
//! header, tiny method bodies and a metadata root with the `#~`, `#Strings`, `#US`, `#GUID`
//! and `#Blob` streams. Every heap and table is small, so all indexes are 2 bytes wide.
//!
//! The managed image declares, in TypeDef order:
//! - `<Module>`
//! - `Widgets.NoteAttribute` with `.ctor(string)`
//! - `Widgets.Spinner` with `.ctor()` and `Spin(int32, bool)`, carrying `Guid`, `ProgId`,
//!   `ComVisible(true)` and `Note("spins")`, the last one through its `MethodDef`
//! - `Widgets.Cache`1` with `.ctor()`
//!
//! The assembly `Widgets, Version=1.2.0.0` is `ComVisible(true)` and targets .NET Core 3.1.

use std::collections::HashMap;

use crate::{
    file::io::{write_compressed_uint, write_le},
    metadata::{customattributes::known::names, typedef::TypeName},
    test::{NET_CORE_31, SPINNER_CLSID},
};

/// RVA of the `.text` section, which starts with the CLI header
pub const TEXT_RVA: u32 = 0x2000;
/// Size of the CLI header
pub const CLI_HEADER_SIZE: u32 = 72;

const FILE_ALIGNMENT: u32 = 0x200;
const SECTION_ALIGNMENT: u32 = 0x2000;
const PE_OFFSET: u32 = 0x80;
const CLR_DIRECTORY: usize = 14;

/// `Public | BeforeFieldInit`
const PUBLIC_CLASS: u32 = 0x0010_0001;
/// `Public | HideBySig | SpecialName | RTSpecialName`
const CONSTRUCTOR: u16 = 0x1886;
/// `Public | HideBySig`
const PUBLIC_METHOD: u16 = 0x0086;

/// Sort bits as emitted by the C# compiler
const SORTED_TABLES: u64 = 0x0000_1600_3301_FA00;

/// A PE library, managed or native.
pub struct TestImage {
    clr: bool,
}

/// The managed `Widgets` library
pub fn create_widgets_image() -> TestImage {
    TestImage { clr: true }
}

/// The same layout without a CLR runtime header directory
pub fn create_native_image() -> TestImage {
    TestImage { clr: false }
}

impl TestImage {
    /// Serializes the image.
    pub fn to_bytes(&self) -> Vec<u8> {
        let text = text_section();
        let text_size = u32::try_from(text.len()).unwrap();
        let raw_size = align(text_size, FILE_ALIGNMENT);

        let mut image = Vec::new();

        // DOS header
        image.extend_from_slice(b"MZ");
        image.resize(0x3C, 0);
        write_le::<u32>(&mut image, PE_OFFSET);
        image.resize(PE_OFFSET as usize, 0);

        // COFF header: i386, one section, executable 32-bit DLL
        image.extend_from_slice(b"PE\0\0");
        write_le::<u16>(&mut image, 0x014C);
        write_le::<u16>(&mut image, 1);
        write_le::<u32>(&mut image, 0);
        write_le::<u32>(&mut image, 0);
        write_le::<u32>(&mut image, 0);
        write_le::<u16>(&mut image, 0xE0);
        write_le::<u16>(&mut image, 0x2102);

        // Optional header, PE32
        write_le::<u16>(&mut image, 0x010B);
        write_le::<u8>(&mut image, 8);
        write_le::<u8>(&mut image, 0);
        write_le::<u32>(&mut image, raw_size);
        write_le::<u32>(&mut image, 0);
        write_le::<u32>(&mut image, 0);
        write_le::<u32>(&mut image, 0);
        write_le::<u32>(&mut image, TEXT_RVA);
        write_le::<u32>(&mut image, 0);
        write_le::<u32>(&mut image, 0x1000_0000);
        write_le::<u32>(&mut image, SECTION_ALIGNMENT);
        write_le::<u32>(&mut image, FILE_ALIGNMENT);
        for version in [4u16, 0, 0, 0, 4, 0] {
            write_le::<u16>(&mut image, version);
        }
        write_le::<u32>(&mut image, 0);
        write_le::<u32>(&mut image, TEXT_RVA + align(text_size, SECTION_ALIGNMENT));
        write_le::<u32>(&mut image, FILE_ALIGNMENT);
        write_le::<u32>(&mut image, 0);
        write_le::<u16>(&mut image, 3);
        write_le::<u16>(&mut image, 0x8540);
        for size in [0x0010_0000u32, 0x1000, 0x0010_0000, 0x1000] {
            write_le::<u32>(&mut image, size);
        }
        write_le::<u32>(&mut image, 0);
        write_le::<u32>(&mut image, 16);
        for directory in 0..16 {
            let (rva, size) = if directory == CLR_DIRECTORY && self.clr {
                (TEXT_RVA, CLI_HEADER_SIZE)
            } else {
                (0, 0)
            };
            write_le::<u32>(&mut image, rva);
            write_le::<u32>(&mut image, size);
        }

        // Section table
        image.extend_from_slice(b".text\0\0\0");
        write_le::<u32>(&mut image, text_size);
        write_le::<u32>(&mut image, TEXT_RVA);
        write_le::<u32>(&mut image, raw_size);
        write_le::<u32>(&mut image, FILE_ALIGNMENT);
        write_le::<u32>(&mut image, 0);
        write_le::<u32>(&mut image, 0);
        write_le::<u16>(&mut image, 0);
        write_le::<u16>(&mut image, 0);
        write_le::<u32>(&mut image, 0x6000_0020);

        image.resize(FILE_ALIGNMENT as usize, 0);
        image.extend_from_slice(&text);
        image.resize((FILE_ALIGNMENT + raw_size) as usize, 0);
        image
    }
}

/// CLI header, one `ret` body per method, then the metadata root.
fn text_section() -> Vec<u8> {
    const METHODS: u32 = 4;
    const BODY: [u8; 2] = [0x06, 0x2A];

    let method_rvas: Vec<u32> = (0..METHODS)
        .map(|index| TEXT_RVA + CLI_HEADER_SIZE + index * 2)
        .collect();
    let metadata_offset = align(CLI_HEADER_SIZE + METHODS * 2, 4);
    let metadata = metadata_root(&method_rvas);

    let mut text = Vec::new();
    write_le::<u32>(&mut text, CLI_HEADER_SIZE);
    write_le::<u16>(&mut text, 2);
    write_le::<u16>(&mut text, 5);
    write_le::<u32>(&mut text, TEXT_RVA + metadata_offset);
    write_le::<u32>(&mut text, u32::try_from(metadata.len()).unwrap());
    // ILONLY
    write_le::<u32>(&mut text, 1);
    write_le::<u32>(&mut text, 0);
    text.resize(CLI_HEADER_SIZE as usize, 0);

    for _ in &method_rvas {
        text.extend_from_slice(&BODY);
    }
    text.resize(metadata_offset as usize, 0);
    text.extend_from_slice(&metadata);
    text
}

fn metadata_root(method_rvas: &[u32]) -> Vec<u8> {
    let mut strings = StringHeap::new();
    let mut blobs = BlobHeap::new();
    let tables = tables_stream(&mut strings, &mut blobs, method_rvas);

    let mut guids = vec![0x5B, 0x6F, 0x0A, 0x2E, 0x2D, 0x7C, 0x4F, 0x7E];
    guids.extend_from_slice(&[0x9A, 0x59, 0x3C, 0x8E, 0x1A, 0x0B, 0x6D, 0x12]);

    let streams: [(&str, Vec<u8>); 5] = [
        ("#~", tables),
        ("#Strings", padded(strings.data)),
        ("#US", vec![0; 4]),
        ("#GUID", guids),
        ("#Blob", padded(blobs.data)),
    ];

    let version = b"v4.0.30319\0\0";
    let headers: usize = streams
        .iter()
        .map(|(name, _)| 8 + ((name.len() + 4) & !3))
        .sum();
    let mut offset = u32::try_from(16 + version.len() + 4 + headers).unwrap();

    let mut root = Vec::new();
    write_le::<u32>(&mut root, 0x424A_5342);
    write_le::<u16>(&mut root, 1);
    write_le::<u16>(&mut root, 1);
    write_le::<u32>(&mut root, 0);
    write_le::<u32>(&mut root, u32::try_from(version.len()).unwrap());
    root.extend_from_slice(version);
    write_le::<u16>(&mut root, 0);
    write_le::<u16>(&mut root, u16::try_from(streams.len()).unwrap());

    for (name, data) in &streams {
        let size = u32::try_from(data.len()).unwrap();
        write_le::<u32>(&mut root, offset);
        write_le::<u32>(&mut root, size);
        root.extend_from_slice(name.as_bytes());
        root.resize(root.len() + ((name.len() + 4) & !3) - name.len(), 0);
        offset += size;
    }

    for (_, data) in &streams {
        root.extend_from_slice(data);
    }
    root
}

fn tables_stream(strings: &mut StringHeap, blobs: &mut BlobHeap, method_rvas: &[u32]) -> Vec<u8> {
    const STRING_CTOR: &[u8] = &[0x20, 0x01, 0x01, 0x0E];
    const BOOL_CTOR: &[u8] = &[0x20, 0x01, 0x01, 0x02];
    const DEFAULT_CTOR: &[u8] = &[0x20, 0x00, 0x01];

    let mut module = Vec::new();
    write_le::<u16>(&mut module, 0);
    write_le::<u16>(&mut module, strings.add("Widgets.dll"));
    write_le::<u16>(&mut module, 1);
    write_le::<u16>(&mut module, 0);
    write_le::<u16>(&mut module, 0);

    // ResolutionScope: AssemblyRef 1
    let type_refs = [
        "System.Object",
        "System.Attribute",
        names::COM_VISIBLE,
        names::TARGET_FRAMEWORK,
        names::GUID,
        names::PROG_ID,
    ];
    let mut type_ref = Vec::new();
    for full_name in type_refs {
        let type_name = TypeName::from_full_name(full_name);
        write_le::<u16>(&mut type_ref, coded(1, 2, 2));
        write_le::<u16>(&mut type_ref, strings.add(&type_name.name));
        write_le::<u16>(&mut type_ref, strings.add(&type_name.namespace));
    }

    // Extends is a TypeDefOrRef pointing at the TypeRefs above
    let type_defs: [(u32, &str, &str, u16, u16); 4] = [
        (0, "", "<Module>", 0, 1),
        (PUBLIC_CLASS, "Widgets", "NoteAttribute", coded(2, 1, 2), 1),
        (PUBLIC_CLASS, "Widgets", "Spinner", coded(1, 1, 2), 2),
        (PUBLIC_CLASS, "Widgets", "Cache`1", coded(1, 1, 2), 4),
    ];
    let mut type_def = Vec::new();
    for (flags, namespace, name, extends, method_list) in type_defs {
        write_le::<u32>(&mut type_def, flags);
        write_le::<u16>(&mut type_def, strings.add(name));
        write_le::<u16>(&mut type_def, strings.add(namespace));
        write_le::<u16>(&mut type_def, extends);
        write_le::<u16>(&mut type_def, 1);
        write_le::<u16>(&mut type_def, method_list);
    }

    let methods: [(u16, &str, &[u8]); 4] = [
        (CONSTRUCTOR, ".ctor", STRING_CTOR),
        (CONSTRUCTOR, ".ctor", DEFAULT_CTOR),
        (PUBLIC_METHOD, "Spin", &[0x20, 0x02, 0x01, 0x08, 0x02]),
        (CONSTRUCTOR, ".ctor", DEFAULT_CTOR),
    ];
    let mut method_def = Vec::new();
    for ((flags, name, signature), rva) in methods.into_iter().zip(method_rvas) {
        write_le::<u32>(&mut method_def, *rva);
        write_le::<u16>(&mut method_def, 0);
        write_le::<u16>(&mut method_def, flags);
        write_le::<u16>(&mut method_def, strings.add(name));
        write_le::<u16>(&mut method_def, blobs.add(signature));
        write_le::<u16>(&mut method_def, 1);
    }

    // MemberRefParent: TypeRef
    let member_refs: [(u16, &[u8]); 4] = [
        (3, BOOL_CTOR),
        (4, STRING_CTOR),
        (5, STRING_CTOR),
        (6, STRING_CTOR),
    ];
    let mut member_ref = Vec::new();
    for (class, signature) in member_refs {
        write_le::<u16>(&mut member_ref, coded(class, 1, 3));
        write_le::<u16>(&mut member_ref, strings.add(".ctor"));
        write_le::<u16>(&mut member_ref, blobs.add(signature));
    }

    // HasCustomAttribute parents sorted ascending: Assembly 1, then TypeDef 3
    let assembly = coded(1, 14, 5);
    let spinner = coded(3, 3, 5);
    let attributes = [
        (assembly, coded(1, 3, 3), bool_blob(true)),
        (assembly, coded(2, 3, 3), string_blob(NET_CORE_31)),
        (spinner, coded(3, 3, 3), string_blob(SPINNER_CLSID)),
        (spinner, coded(4, 3, 3), string_blob("Widgets.Spinner")),
        (spinner, coded(1, 3, 3), bool_blob(true)),
        (spinner, coded(1, 2, 3), string_blob("spins")),
    ];
    let mut custom_attribute = Vec::new();
    for (parent, constructor, value) in &attributes {
        write_le::<u16>(&mut custom_attribute, *parent);
        write_le::<u16>(&mut custom_attribute, *constructor);
        write_le::<u16>(&mut custom_attribute, blobs.add(value));
    }

    let mut assembly_row = Vec::new();
    write_le::<u32>(&mut assembly_row, 0x8004);
    for part in [1u16, 2, 0, 0] {
        write_le::<u16>(&mut assembly_row, part);
    }
    write_le::<u32>(&mut assembly_row, 0);
    write_le::<u16>(&mut assembly_row, 0);
    write_le::<u16>(&mut assembly_row, strings.add("Widgets"));
    write_le::<u16>(&mut assembly_row, 0);

    let mut assembly_ref = Vec::new();
    for part in [4u16, 0, 0, 0] {
        write_le::<u16>(&mut assembly_ref, part);
    }
    write_le::<u32>(&mut assembly_ref, 0);
    write_le::<u16>(
        &mut assembly_ref,
        blobs.add(&[0xB7, 0x7A, 0x5C, 0x56, 0x19, 0x34, 0xE0, 0x89]),
    );
    write_le::<u16>(&mut assembly_ref, strings.add("mscorlib"));
    write_le::<u16>(&mut assembly_ref, 0);
    write_le::<u16>(&mut assembly_ref, 0);

    // TypeOrMethodDef owner: TypeDef 4
    let mut generic_param = Vec::new();
    write_le::<u16>(&mut generic_param, 0);
    write_le::<u16>(&mut generic_param, 0);
    write_le::<u16>(&mut generic_param, coded(4, 0, 1));
    write_le::<u16>(&mut generic_param, strings.add("T"));

    let tables: [(u8, u32, Vec<u8>); 9] = [
        (0x00, 1, module),
        (0x01, 6, type_ref),
        (0x02, 4, type_def),
        (0x06, 4, method_def),
        (0x0A, 4, member_ref),
        (0x0C, 6, custom_attribute),
        (0x20, 1, assembly_row),
        (0x23, 1, assembly_ref),
        (0x2A, 1, generic_param),
    ];

    let mut stream = Vec::new();
    write_le::<u32>(&mut stream, 0);
    // Schema 2.0, small heaps
    write_le::<u8>(&mut stream, 2);
    write_le::<u8>(&mut stream, 0);
    write_le::<u8>(&mut stream, 0);
    write_le::<u8>(&mut stream, 1);
    let valid = tables
        .iter()
        .fold(0u64, |valid, (table, _, _)| valid | (1u64 << table));
    write_le::<u64>(&mut stream, valid);
    write_le::<u64>(&mut stream, SORTED_TABLES);
    for (_, rows, _) in &tables {
        write_le::<u32>(&mut stream, *rows);
    }
    for (_, _, data) in &tables {
        stream.extend_from_slice(data);
    }
    padded(stream)
}

/// A 2-byte coded index.
fn coded(row: u16, tag: u16, bits: u32) -> u16 {
    (row << bits) | tag
}

fn bool_blob(value: bool) -> Vec<u8> {
    vec![0x01, 0x00, u8::from(value), 0x00, 0x00]
}

fn string_blob(value: &str) -> Vec<u8> {
    let mut blob = vec![0x01, 0x00];
    write_compressed_uint(&mut blob, u32::try_from(value.len()).unwrap()).unwrap();
    blob.extend_from_slice(value.as_bytes());
    blob.extend_from_slice(&[0x00, 0x00]);
    blob
}

fn align(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

fn padded(mut data: Vec<u8>) -> Vec<u8> {
    data.resize(data.len().div_ceil(4) * 4, 0);
    data
}

/// `#Strings` heap with deduplicated entries.
struct StringHeap {
    data: Vec<u8>,
    offsets: HashMap<String, u16>,
}

impl StringHeap {
    fn new() -> Self {
        Self {
            data: vec![0],
            offsets: HashMap::new(),
        }
    }

    fn add(&mut self, value: &str) -> u16 {
        if value.is_empty() {
            return 0;
        }
        if let Some(offset) = self.offsets.get(value) {
            return *offset;
        }

        let offset = u16::try_from(self.data.len()).unwrap();
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        self.offsets.insert(value.to_string(), offset);
        offset
    }
}

/// `#Blob` heap, every blob prefixed with its compressed length.
struct BlobHeap {
    data: Vec<u8>,
}

impl BlobHeap {
    fn new() -> Self {
        Self { data: vec![0] }
    }

    fn add(&mut self, blob: &[u8]) -> u16 {
        if blob.is_empty() {
            return 0;
        }

        let offset = u16::try_from(self.data.len()).unwrap();
        write_compressed_uint(&mut self.data, u32::try_from(blob.len()).unwrap()).unwrap();
        self.data.extend_from_slice(blob);
        offset
    }
}
