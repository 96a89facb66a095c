// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ERROS DOS FLUXOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Todos os erros são recuperáveis: a interface volta ao estado ocioso e o
// usuário precisa disparar a ação de novo (sem retry automático).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::api::ApiError;

/// Classe do erro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Pré-condição não atendida; nenhuma requisição foi enviada
    Precondition,
    /// Falha de rede
    Transport,
    /// Erro reportado pelo servidor (ou resposta fora do formato)
    Server,
    /// Resposta de sucesso com arquivo vazio
    Integrity,
}

/// Erro de um fluxo de busca, prévia, geração ou cadastro
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkflowError {
    #[error("Envie a base.")]
    MissingBase,

    #[error("Nenhum CPF, Nome ou E-mail válido para buscar.")]
    NoIdentifiers,

    #[error("Envie a lista ou insira os nomes/CPFs")]
    MissingList,

    #[error("Selecione pelo menos um arquivo")]
    NoFiles,

    #[error("Arquivo gerado inválido")]
    EmptyFile,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WorkflowError {
    /// Classe do erro, usada para decidir como apresentar
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingBase | Self::NoIdentifiers | Self::MissingList | Self::NoFiles => {
                ErrorKind::Precondition
            }
            Self::EmptyFile => ErrorKind::Integrity,
            Self::Api(ApiError::Network(_)) => ErrorKind::Transport,
            Self::Api(_) => ErrorKind::Server,
        }
    }

    /// Verdadeiro quando nenhuma requisição chegou a ser enviada
    pub fn is_precondition(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(WorkflowError::MissingBase.kind(), ErrorKind::Precondition);
        assert_eq!(WorkflowError::NoIdentifiers.kind(), ErrorKind::Precondition);
        assert_eq!(WorkflowError::EmptyFile.kind(), ErrorKind::Integrity);
        assert_eq!(
            WorkflowError::from(ApiError::Network("timeout".into())).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            WorkflowError::from(ApiError::Server {
                status: 400,
                message: "Envie a base".into()
            })
            .kind(),
            ErrorKind::Server
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(WorkflowError::MissingBase.to_string(), "Envie a base.");
        assert_eq!(WorkflowError::EmptyFile.to_string(), "Arquivo gerado inválido");
        let server = WorkflowError::from(ApiError::Server {
            status: 500,
            message: "falhou".into(),
        });
        assert_eq!(server.to_string(), "falhou");
    }
}
