//! Standard-library declarations
//!
//! Built-in classes, modules and method signatures are registered before any
//! user file. They have no method bodies: inference stops at their declared
//! types.

pub mod cache;
pub mod converter;
mod core;

pub use cache::SignatureCache;
pub use converter::TypeConverter;

use crate::env::{ConstKind, GlobalEnv, MethodKey, MethodKind};
use crate::error::StoreError;
use crate::store::{
    singleton_fqname, DeclarationSite, EdgeKind, ReceiverKind, RespondPatcher, Visibility,
};
use crate::types::Type;
use serde::{Deserialize, Serialize};

/// Declaring path recorded for everything the stdlib registers
pub const STDLIB_PATH: &str = "<stdlib>";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReceiverDecl {
    pub name: String,
    pub kind: ReceiverKind,
    pub superclass: Option<String>,
    pub includes: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub receiver: String,
    pub name: String,
    pub singleton: bool,
    pub visibility: Visibility,
    /// Parameter name and type signature, in declaration order
    pub params: Vec<(String, String)>,
    pub return_type: String,
}

/// Constant with a declared type, such as `ARGV`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConstantDecl {
    pub name: String,
    pub type_signature: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StdlibDeclarations {
    pub receivers: Vec<ReceiverDecl>,
    pub methods: Vec<MethodDecl>,
    pub constants: Vec<ConstantDecl>,
    pub interfaces: Vec<String>,
}

impl StdlibDeclarations {
    /// The built-in core set
    pub fn core() -> Self {
        core::declarations()
    }

    /// Declarations from the signature cache, or the core set
    ///
    /// A missing or outdated cache is rebuilt from the core set.
    pub fn load_or_build(use_cache: bool) -> Self {
        if !use_cache {
            return Self::core();
        }

        match SignatureCache::load() {
            Ok(cache) if cache.is_valid(env!("CARGO_PKG_VERSION")) => {
                tracing::debug!(
                    "loaded {} stdlib methods from cache",
                    cache.declarations.methods.len()
                );
                return cache.declarations;
            }
            Ok(_) => tracing::debug!("signature cache is outdated, rebuilding"),
            Err(err) => tracing::debug!("no usable signature cache: {:#}", err),
        }

        let declarations = Self::core();
        let cache = SignatureCache::new(declarations.clone());
        if let Err(err) = cache.save() {
            tracing::warn!("failed to write signature cache: {:#}", err);
        }
        declarations
    }

    /// Register every declaration in `genv`
    pub fn load_into(&self, genv: &mut GlobalEnv) -> Result<(), StoreError> {
        let site = DeclarationSite::new(STDLIB_PATH, 0, env!("CARGO_PKG_VERSION"));

        for receiver in &self.receivers {
            match receiver.kind {
                ReceiverKind::Class => {
                    genv.consts
                        .create_class_or_module(&receiver.name, ConstKind::Class, STDLIB_PATH);
                    genv.store.insert_class(&receiver.name, &site)?;
                }
                ReceiverKind::Module => {
                    genv.consts
                        .create_class_or_module(&receiver.name, ConstKind::Module, STDLIB_PATH);
                    genv.store.insert_module(&receiver.name, &site)?;
                }
            }
        }

        for receiver in &self.receivers {
            if let Some(superclass) = &receiver.superclass {
                genv.store
                    .insert_inherit(&receiver.name, "", superclass, STDLIB_PATH, 0)?;
            }
            for module in &receiver.includes {
                genv.store
                    .insert_edge(EdgeKind::Mixin, &receiver.name, "", module, STDLIB_PATH, 0)?;
            }
        }

        for method in &self.methods {
            self.load_method(genv, method)?;
        }

        for constant in &self.constants {
            let ty = TypeConverter::parse(&constant.type_signature);
            genv.consts
                .create_variable(&constant.name, STDLIB_PATH, None, Some(ty));
        }
        for interface in &self.interfaces {
            genv.consts.create_variable(
                interface,
                STDLIB_PATH,
                None,
                Some(Type::Interface(interface.clone())),
            );
        }

        let receivers = genv.store.all_receiver_names()?;
        RespondPatcher::new(&genv.store).patch(&receivers)?;

        tracing::debug!(
            "stdlib loaded: {} receivers, {} methods",
            receivers.len(),
            self.methods.len()
        );
        Ok(())
    }

    fn load_method(&self, genv: &mut GlobalEnv, method: &MethodDecl) -> Result<(), StoreError> {
        let fqname = if method.singleton {
            singleton_fqname(&method.receiver)
        } else {
            method.receiver.clone()
        };
        let Some(receiver) = genv.store.find_receiver(&fqname)? else {
            tracing::debug!("stdlib method {} on undeclared {}", method.name, fqname);
            return Ok(());
        };
        genv.store
            .insert_method(receiver.id, method.visibility, &method.name, STDLIB_PATH, 0)?;

        let key = MethodKey::new(&method.receiver, &method.name, method.singleton);
        let entry = genv
            .methods
            .add(key, MethodKind::Builtin, method.visibility, STDLIB_PATH);
        entry.return_type = Some(TypeConverter::parse(&method.return_type));
        entry.arg_types = method
            .params
            .iter()
            .map(|(name, signature)| (name.clone(), TypeConverter::parse(signature)))
            .collect();
        Ok(())
    }
}
