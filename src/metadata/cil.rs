//! Module metadata read from managed PE images.
//!
//! [`CilSource`] loads a library with `dotscope` and hands out a [`CilModule`], which projects
//! the raw rows of the `Assembly`, `TypeDef`, `MethodDef`, `GenericParam`, `CustomAttribute`,
//! `MemberRef` and `TypeRef` tables into the views the reader works with. Only the tables and
//! heaps are used, the resolved type system of `dotscope` is not consulted.
//!
//! # Examples
//!
//! ```rust,no_run
//! use comscope::{metadata::cil::CilSource, LibraryReader};
//!
//! let reader = LibraryReader::new(CilSource);
//! let metadata = reader.read("Widgets.comhost.dll")?;
//! for descriptor in &metadata.descriptors {
//!     println!("{descriptor}");
//! }
//! # Ok::<(), comscope::Error>(())
//! ```

use std::{collections::HashMap, path::Path};

use dotscope::{
    metadata::{
        streams::TablesHeader,
        tables::{
            AssemblyRaw, CodedIndex, CustomAttributeRaw, GenericParamRaw, MemberRefRaw,
            MethodDefRaw, RowDefinition, TableId as RawTable, TypeDefRaw, TypeRefRaw,
        },
    },
    CilObject,
};
use log::debug;

use crate::{
    file::parser::Parser,
    metadata::{
        access::{MetadataSource, ModuleMetadata},
        customattributes::AttributeRecord,
        identity::{AssemblyIdentity, AssemblyVersion, StrongName},
        token::{TableId, Token},
        typedef::{MethodDefinition, TypeDefinition, TypeName},
    },
    Result,
};

/// `GENERIC` flag of a method signature's calling convention
const SIG_GENERIC: u8 = 0x10;

/// A [`MetadataSource`] reading managed PE images from disk.
///
/// Classification uses the default, which looks for a CLR runtime header.
#[derive(Debug, Clone, Copy, Default)]
pub struct CilSource;

impl MetadataSource for CilSource {
    fn open(&self, path: &Path) -> Result<Box<dyn ModuleMetadata + '_>> {
        Ok(Box::new(CilModule::from_file(path)?))
    }
}

/// The metadata tables and heaps of one loaded managed image.
pub struct CilModule {
    object: CilObject,
}

impl CilModule {
    /// Loads the managed image at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MetadataErr`] if the image or its metadata can not be loaded.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading metadata of {}", path.display());

        Ok(Self {
            object: CilObject::from_file(path)?,
        })
    }

    fn tables(&self) -> Result<&TablesHeader<'_>> {
        self.object
            .tables()
            .ok_or_else(|| malformed_error!("Module has no metadata tables"))
    }

    fn string(&self, index: u32) -> Result<String> {
        let strings = self
            .object
            .strings()
            .ok_or_else(|| malformed_error!("Module has no #Strings heap"))?;

        Ok(strings.get(heap_offset(index)?)?.to_string())
    }

    fn blob(&self, index: u32) -> Result<&[u8]> {
        let blobs = self
            .object
            .blob()
            .ok_or_else(|| malformed_error!("Module has no #Blob heap"))?;

        Ok(blobs.get(heap_offset(index)?)?)
    }

    /// Number of parameters declared by a `MethodDefSig`, without the return type.
    fn param_count(&self, signature: u32) -> Result<u32> {
        let mut parser = Parser::new(self.blob(signature)?);

        let calling_convention = parser.read_le::<u8>()?;
        if calling_convention & SIG_GENERIC != 0 {
            parser.read_compressed_uint()?;
        }

        parser.read_compressed_uint()
    }

    fn attribute(&self, row: &CustomAttributeRaw, owner: Token) -> Result<AttributeRecord> {
        let constructor = match row.constructor.tag {
            RawTable::MethodDef | RawTable::MemberRef => Token::new(row.constructor.token.value()),
            other => {
                return Err(malformed_error!(
                    "CustomAttribute {} has a constructor in table {:?}",
                    row.rid,
                    other
                ))
            }
        };

        Ok(AttributeRecord::new(
            Token::from_parts(TableId::CUSTOM_ATTRIBUTE, row.rid),
            owner,
            constructor,
            self.blob(row.value)?.to_vec(),
        ))
    }

    fn type_name(&self, class: &CodedIndex) -> Result<TypeName> {
        let tables = self.tables()?;

        match class.tag {
            RawTable::TypeRef => {
                let row = find_row(rows::<TypeRefRaw>(tables, RawTable::TypeRef), class.row)
                    .ok_or_else(|| malformed_error!("Unknown TypeRef {}", class.row))?;
                Ok(TypeName::new(
                    self.string(row.type_namespace)?,
                    self.string(row.type_name)?,
                ))
            }
            RawTable::TypeDef => {
                let row = find_row(rows::<TypeDefRaw>(tables, RawTable::TypeDef), class.row)
                    .ok_or_else(|| malformed_error!("Unknown TypeDef {}", class.row))?;
                Ok(TypeName::new(
                    self.string(row.type_namespace)?,
                    self.string(row.type_name)?,
                ))
            }
            other => Err(malformed_error!(
                "Member parent in table {:?} is not a type",
                other
            )),
        }
    }

    /// Declaring type of the `MethodDef` row `rid`.
    fn method_owner(&self, rid: u32) -> Result<TypeName> {
        let tables = self.tables()?;
        let method_count = rows::<MethodDefRaw>(tables, RawTable::MethodDef).len();
        if rid == 0 || usize::try_from(rid).map_or(true, |rid| rid > method_count) {
            return Err(malformed_error!("Unknown MethodDef {}", rid));
        }

        // Method lists are ascending, types without methods share the start of their successor
        let owner = rows::<TypeDefRaw>(tables, RawTable::TypeDef)
            .into_iter()
            .rev()
            .find(|row| row.method_list <= rid)
            .ok_or_else(|| malformed_error!("MethodDef {} has no declaring type", rid))?;

        Ok(TypeName::new(
            self.string(owner.type_namespace)?,
            self.string(owner.type_name)?,
        ))
    }
}

impl ModuleMetadata for CilModule {
    fn identity(&self) -> Result<AssemblyIdentity> {
        let assembly = rows::<AssemblyRaw>(self.tables()?, RawTable::Assembly)
            .into_iter()
            .next()
            .ok_or_else(|| malformed_error!("Module has no Assembly row"))?;

        let version = AssemblyVersion {
            major: version_part(assembly.major_version)?,
            minor: version_part(assembly.minor_version)?,
            build: version_part(assembly.build_number)?,
            revision: version_part(assembly.revision_number)?,
        };

        let mut identity = AssemblyIdentity::new(self.string(assembly.name)?, version);

        let culture = self.string(assembly.culture)?;
        if !culture.is_empty() {
            identity = identity.with_culture(culture);
        }

        let public_key = self.blob(assembly.public_key)?;
        if !public_key.is_empty() {
            identity = identity.with_strong_name(StrongName::PublicKey(public_key.to_vec()));
        }

        Ok(identity)
    }

    fn runtime_version(&self) -> Result<String> {
        let version = &self.object.metadata_root().version;

        Ok(version.trim_end_matches('\0').to_string())
    }

    fn assembly_attributes(&self) -> Result<Vec<AttributeRecord>> {
        rows::<CustomAttributeRaw>(self.tables()?, RawTable::CustomAttribute)
            .iter()
            .filter(|row| row.parent.tag == RawTable::Assembly)
            .map(|row| self.attribute(row, Token::ASSEMBLY))
            .collect()
    }

    fn type_definitions(&self) -> Result<Vec<TypeDefinition>> {
        let tables = self.tables()?;
        let type_rows = rows::<TypeDefRaw>(tables, RawTable::TypeDef);
        let method_rows = rows::<MethodDefRaw>(tables, RawTable::MethodDef);

        let mut generic_counts: HashMap<u32, u32> = HashMap::new();
        for param in rows::<GenericParamRaw>(tables, RawTable::GenericParam) {
            if param.owner.tag == RawTable::TypeDef {
                *generic_counts.entry(param.owner.row).or_default() += 1;
            }
        }

        let mut attributes: HashMap<u32, Vec<AttributeRecord>> = HashMap::new();
        for row in rows::<CustomAttributeRaw>(tables, RawTable::CustomAttribute) {
            if row.parent.tag == RawTable::TypeDef {
                let owner = Token::from_parts(TableId::TYPE_DEF, row.parent.row);
                attributes
                    .entry(row.parent.row)
                    .or_default()
                    .push(self.attribute(&row, owner)?);
            }
        }

        let mut definitions = Vec::with_capacity(type_rows.len());
        for (index, row) in type_rows.iter().enumerate() {
            let mut definition = TypeDefinition::new(
                Token::new(row.token.value()),
                self.string(row.type_namespace)?,
                self.string(row.type_name)?,
                row.flags,
            );
            definition.generic_param_count = generic_counts.get(&row.rid).copied().unwrap_or(0);
            definition.custom_attributes = attributes.remove(&row.rid).unwrap_or_default();

            let end = type_rows
                .get(index + 1)
                .map_or(usize::MAX, |next| list_start(next.method_list));
            for method in method_rows
                .iter()
                .take(end)
                .skip(list_start(row.method_list))
            {
                definition.methods.push(MethodDefinition::new(
                    Token::new(method.token.value()),
                    self.string(method.name)?,
                    method.flags,
                    self.param_count(method.signature)?,
                ));
            }

            definitions.push(definition);
        }

        Ok(definitions)
    }

    fn constructor_type(&self, constructor: Token) -> Result<TypeName> {
        match constructor.table() {
            TableId::METHOD_DEF => self.method_owner(constructor.row()),
            TableId::MEMBER_REF => {
                let member = find_row(
                    rows::<MemberRefRaw>(self.tables()?, RawTable::MemberRef),
                    constructor.row(),
                )
                .ok_or_else(|| malformed_error!("Unknown attribute constructor {}", constructor))?;

                self.type_name(&member.class)
            }
            _ => Err(malformed_error!(
                "Attribute constructor {} is neither a MethodDef nor a MemberRef",
                constructor
            )),
        }
    }
}

/// All rows of a table in table order, empty if the table is absent.
fn rows<'a, T: RowDefinition<'a> + 'a>(tables: &TablesHeader<'a>, table: RawTable) -> Vec<T> {
    tables
        .table::<T>(table)
        .map(|rows| rows.iter().collect())
        .unwrap_or_default()
}

/// Row `rid` of a table returned by [`rows`].
fn find_row<T>(rows: Vec<T>, rid: u32) -> Option<T> {
    let index = usize::try_from(rid).ok()?.checked_sub(1)?;
    rows.into_iter().nth(index)
}

/// 0-based position of the first row of a 1-based member list.
fn list_start(list: u32) -> usize {
    usize::try_from(list).map_or(usize::MAX, |list| list.saturating_sub(1))
}

fn heap_offset(index: u32) -> Result<usize> {
    usize::try_from(index).map_err(|_| malformed_error!("Heap index {} out of range", index))
}

fn version_part(value: u32) -> Result<u16> {
    u16::try_from(value).map_err(|_| malformed_error!("Version component {} out of range", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::customattributes::{
            known::names, AttributeDecoder, AttributeRegistry, TypeResolver,
        },
        test::{create_widgets_image, TestImage, SPINNER_CLSID},
    };

    fn load(image: &TestImage) -> (tempfile::TempDir, CilModule) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Widgets.dll");
        std::fs::write(&path, image.to_bytes()).unwrap();

        let module = CilModule::from_file(&path).unwrap();
        (dir, module)
    }

    #[test]
    fn assembly_row_and_root() {
        let (_dir, module) = load(&create_widgets_image());

        let identity = module.identity().unwrap();
        assert_eq!(identity.name, "Widgets");
        assert_eq!(identity.version, AssemblyVersion::new(1, 2, 0, 0));
        assert_eq!(identity.culture, None);
        assert!(!identity.is_strong_named());
        assert_eq!(module.runtime_version().unwrap(), "v4.0.30319");
    }

    #[test]
    fn types_methods_and_generics() {
        let (_dir, module) = load(&create_widgets_image());

        let types = module.type_definitions().unwrap();
        let names: Vec<String> = types.iter().map(TypeDefinition::full_name).collect();
        assert_eq!(
            names,
            [
                "<Module>",
                "Widgets.NoteAttribute",
                "Widgets.Spinner",
                "Widgets.Cache`1"
            ]
        );

        assert!(types[0].is_module_type());
        assert!(types[0].methods.is_empty());
        assert_eq!(types[1].methods.len(), 1);
        assert_eq!(types[1].methods[0].param_count, 1);

        let spinner = &types[2];
        assert_eq!(spinner.token, Token::new(0x0200_0003));
        assert_eq!(spinner.generic_param_count, 0);
        let methods: Vec<(&str, u32)> = spinner
            .methods
            .iter()
            .map(|method| (method.name.as_str(), method.param_count))
            .collect();
        assert_eq!(methods, [(".ctor", 0), ("Spin", 2)]);
        assert!(spinner.constructors().all(MethodDefinition::is_constructor));

        assert_eq!(types[3].generic_param_count, 1);
        assert_eq!(types[3].methods.len(), 1);
    }

    #[test]
    fn attributes_resolve_through_member_and_method_rows() {
        let (_dir, module) = load(&create_widgets_image());

        let assembly = module.assembly_attributes().unwrap();
        let assembly_types: Vec<String> = assembly
            .iter()
            .map(|record| module.constructor_type(record.constructor).unwrap().full_name())
            .collect();
        assert_eq!(assembly_types, [names::COM_VISIBLE, names::TARGET_FRAMEWORK]);
        assert!(assembly.iter().all(|record| record.owner == Token::ASSEMBLY));

        let spinner = module.type_definitions().unwrap().remove(2);
        let spinner_types: Vec<String> = spinner
            .custom_attributes
            .iter()
            .map(|record| module.constructor_type(record.constructor).unwrap().full_name())
            .collect();
        assert_eq!(
            spinner_types,
            [
                names::GUID,
                names::PROG_ID,
                names::COM_VISIBLE,
                "Widgets.NoteAttribute"
            ]
        );
        assert_eq!(
            spinner.custom_attributes[3].constructor.table(),
            TableId::METHOD_DEF
        );
        assert!(spinner
            .custom_attributes
            .iter()
            .all(|record| record.owner == spinner.token));

        let registry = AttributeRegistry::new();
        let resolver = TypeResolver::new();
        let decoded = AttributeDecoder::new(&registry, &resolver)
            .decode_scope(&module, spinner.token, &spinner.custom_attributes)
            .unwrap();
        assert_eq!(decoded.guid().unwrap().as_deref(), Some(SPINNER_CLSID));
        assert_eq!(
            decoded.prog_id().unwrap().as_deref(),
            Some("Widgets.Spinner")
        );
        assert_eq!(decoded.com_visible().unwrap(), Some(true));
    }

    #[test]
    fn unknown_constructors_are_malformed() {
        let (_dir, module) = load(&create_widgets_image());

        assert!(matches!(
            module.constructor_type(Token::new(0x0A00_0063)),
            Err(crate::Error::Malformed { .. })
        ));
        assert!(module.constructor_type(Token::new(0x0600_0063)).is_err());
        assert!(module.constructor_type(Token::new(0x0600_0000)).is_err());
        assert!(module.constructor_type(Token::new(0x0200_0001)).is_err());
    }

    #[test]
    fn non_images_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Widgets.dll");
        std::fs::write(&path, b"MZ").unwrap();

        assert!(CilSource.open(&path).is_err());
    }

    #[test]
    fn row_helpers() {
        assert_eq!(find_row(vec!['a', 'b'], 2), Some('b'));
        assert_eq!(find_row(vec!['a', 'b'], 0), None);
        assert_eq!(find_row(vec!['a', 'b'], 3), None);
        assert_eq!(list_start(1), 0);
        assert_eq!(list_start(0), 0);
        assert!(version_part(0x1_0000).is_err());
    }
}
