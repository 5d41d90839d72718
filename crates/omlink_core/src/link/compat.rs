use rustc_hash::FxHashMap;

use super::error::Mismatch;
use crate::{
    ir::{
        ClassDef, ClassExtern, HwModuleDef, HwModuleExtern, Named, Param, Port, SymbolKind,
        Visibility,
    },
    types::Type,
};

pub(crate) trait Definition: Named {
    const KIND: SymbolKind;

    fn is_public(&self) -> bool {
        false
    }
}

pub(crate) trait Declaration<D>: Named {
    fn check_against(&self, definition: &D) -> Result<(), Mismatch>;
}

impl Definition for ClassDef {
    const KIND: SymbolKind = SymbolKind::Class;
}

impl Definition for HwModuleDef {
    const KIND: SymbolKind = SymbolKind::HwModule;

    fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

impl Declaration<HwModuleDef> for HwModuleExtern {
    fn check_against(&self, definition: &HwModuleDef) -> Result<(), Mismatch> {
        check_ports(&definition.ports, &self.ports)
    }
}

impl Declaration<ClassDef> for ClassExtern {
    fn check_against(&self, definition: &ClassDef) -> Result<(), Mismatch> {
        check_arguments(&definition.params, &self.params)?;

        let defined: FxHashMap<&str, &Type> = definition
            .fields
            .iter()
            .map(|field| (field.name.as_str(), &field.ty))
            .collect();

        for field in &self.fields {
            match defined.get(field.name.as_str()) {
                None => {
                    return Err(Mismatch::MissingField {
                        field: field.name.clone(),
                    });
                }
                Some(&ty) if *ty != field.ty => {
                    return Err(Mismatch::FieldType {
                        field: field.name.clone(),
                        defined: ty.clone(),
                        declared: field.ty.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

fn check_ports(defined: &[Port], declared: &[Port]) -> Result<(), Mismatch> {
    if defined.len() != declared.len() {
        return Err(Mismatch::PortCount {
            defined: defined.len(),
            declared: declared.len(),
        });
    }

    match defined
        .iter()
        .zip(declared)
        .position(|(defined, declared)| defined != declared)
    {
        Some(index) => Err(Mismatch::Port {
            index,
            defined: defined[index].clone(),
            declared: declared[index].clone(),
        }),
        None => Ok(()),
    }
}

// Argument names are local to each body, only positions and types have to agree.
fn check_arguments(defined: &[Param], declared: &[Param]) -> Result<(), Mismatch> {
    if defined.len() != declared.len() {
        return Err(Mismatch::ArgumentCount {
            defined: defined.len(),
            declared: declared.len(),
        });
    }

    for (index, (defined, declared)) in defined.iter().zip(declared).enumerate() {
        if defined.ty != declared.ty {
            return Err(Mismatch::ArgumentType {
                index,
                defined: defined.ty.clone(),
                declared: declared.ty.clone(),
            });
        }
    }

    Ok(())
}
