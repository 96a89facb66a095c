// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ESTADOS DA CONFIRMAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use super::summary::PreviewSummary;

/// Estado do portão de confirmação - transições explícitas
///
/// `Idle → Previewing → AwaitingConfirmation → Generating → Idle`,
/// com retorno a `Idle` em falha de prévia ou cancelamento.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GateState {
    /// Nenhuma ação em andamento
    #[default]
    Idle,

    /// Prévia (dry-run) enviada ao backend
    Previewing,

    /// Resumo exibido; espera a decisão do usuário sem timeout
    AwaitingConfirmation {
        /// Resumo em exibição
        summary: PreviewSummary,
    },

    /// Requisição de geração enviada
    Generating,
}

impl GateState {
    /// Nome curto para logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Previewing => "previewing",
            Self::AwaitingConfirmation { .. } => "awaiting_confirmation",
            Self::Generating => "generating",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Resumo em exibição, se estiver aguardando confirmação
    pub fn summary(&self) -> Option<&PreviewSummary> {
        match self {
            Self::AwaitingConfirmation { summary } => Some(summary),
            _ => None,
        }
    }

    /// Verifica se uma transição é válida
    pub fn can_transition_to(&self, target: &GateState) -> bool {
        matches!(
            (self, target),
            (GateState::Idle, GateState::Previewing) |
            // Prévia ok → confirmação; prévia com erro → ocioso
            (GateState::Previewing, GateState::AwaitingConfirmation { .. }) |
            (GateState::Previewing, GateState::Idle) |
            // Confirmou → geração; cancelou → ocioso
            (GateState::AwaitingConfirmation { .. }, GateState::Generating) |
            (GateState::AwaitingConfirmation { .. }, GateState::Idle) |
            (GateState::Generating, GateState::Idle)
        )
    }
}
