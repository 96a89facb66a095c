// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FLAG DE EXECUÇÃO POR AÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Uma ação em lote por tipo de cada vez. Um segundo disparo enquanto a
// primeira está em andamento é descartado (não enfileirado).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::ActionKind;

/// Flags de "em andamento" para cadastro e inativação
#[derive(Debug, Default)]
pub struct ActionGuard {
    cadastro: AtomicBool,
    inativacao: AtomicBool,
}

impl ActionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, action: ActionKind) -> &AtomicBool {
        match action {
            ActionKind::Cadastro => &self.cadastro,
            ActionKind::Inativacao => &self.inativacao,
        }
    }

    /// Marca a ação como em andamento. `None` quando já estava.
    ///
    /// A flag é liberada quando o `InFlight` devolvido sai de escopo.
    pub fn try_begin(&self, action: ActionKind) -> Option<InFlight<'_>> {
        self.flag(action)
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight {
                flag: self.flag(action),
                action,
            })
    }

    pub fn is_in_flight(&self, action: ActionKind) -> bool {
        self.flag(action).load(Ordering::Acquire)
    }
}

/// Ação em andamento; libera a flag no drop (inclusive em erro)
#[derive(Debug)]
pub struct InFlight<'a> {
    flag: &'a AtomicBool,
    action: ActionKind,
}

impl InFlight<'_> {
    pub fn action(&self) -> ActionKind {
        self.action
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_trigger_is_dropped() {
        let guard = ActionGuard::new();
        let first = guard.try_begin(ActionKind::Inativacao);
        assert!(first.is_some());
        assert!(guard.try_begin(ActionKind::Inativacao).is_none());
        assert!(guard.is_in_flight(ActionKind::Inativacao));

        drop(first);
        assert!(!guard.is_in_flight(ActionKind::Inativacao));
        assert!(guard.try_begin(ActionKind::Inativacao).is_some());
    }

    #[test]
    fn test_actions_are_independent() {
        let guard = ActionGuard::new();
        let _inativacao = guard.try_begin(ActionKind::Inativacao).unwrap();
        let cadastro = guard.try_begin(ActionKind::Cadastro);
        assert!(cadastro.is_some());
        assert_eq!(cadastro.unwrap().action(), ActionKind::Cadastro);
    }
}
