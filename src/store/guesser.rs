//! Receiver guessing from the respond-to index

use super::{strip_singleton, ReceiverKind, SymbolStore};
use crate::error::StoreError;
use crate::types::Type;

pub struct ReceiverGuesser;

impl ReceiverGuesser {
    /// Guess which receiver answers every method in `method_names`
    ///
    /// A single matching receiver wins. When several match, only methods
    /// declared on the receiver itself are considered; a single class then
    /// wins, while a module or several candidates give `any`.
    pub fn guess(store: &SymbolStore, method_names: &[String]) -> Result<Type, StoreError> {
        if method_names.is_empty() {
            return Ok(Type::Any);
        }

        let candidates = store.receivers_respond_to(method_names, false)?;
        match candidates.as_slice() {
            [] => return Ok(Type::Any),
            [only] => return Ok(Self::receiver_type(only)),
            _ => {}
        }

        let declaring = store.receivers_respond_to(method_names, true)?;
        let [only] = declaring.as_slice() else {
            return Ok(Type::Any);
        };

        match store.find_receiver(only)? {
            Some(receiver) if receiver.kind == ReceiverKind::Class => {
                Ok(Self::receiver_type(&receiver.fqname))
            }
            _ => Ok(Type::Any),
        }
    }

    fn receiver_type(fqname: &str) -> Type {
        let (name, singleton) = strip_singleton(fqname);
        Type::Const {
            name: name.to_string(),
            singleton,
        }
    }
}
