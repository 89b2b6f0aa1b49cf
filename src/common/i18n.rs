// src/common/i18n.rs

// Idioma das mensagens mostradas ao usuário (notificações, rótulos de status).
// A lista de idiomas vem da configuração no mesmo formato do cabeçalho
// Accept-Language (ex: "pt-BR,pt;q=0.9,en;q=0.8") e também é repassada ao backend.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Pt,
    En,
}

impl Locale {
    /// Resolve a primeira língua suportada de uma lista no formato Accept-Language.
    pub fn resolve(header_str: &str) -> Self {
        accept_language::parse(header_str)
            .iter()
            // "pt-BR" -> "pt", "en" -> "en"
            .filter_map(|tag| tag.split('-').next())
            .find_map(Self::from_code)
            .unwrap_or_default()
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "pt" => Some(Locale::Pt),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    /// Valor enviado no cabeçalho Accept-Language das requisições.
    pub fn header_value(&self) -> &'static str {
        match self {
            Locale::Pt => "pt-BR,pt;q=0.9",
            Locale::En => "en",
        }
    }

    pub fn translate(&self, key: &str) -> String {
        translate(*self, key)
    }
}

// Catálogo de mensagens: chave -> (pt, en)
fn catalog(key: &str) -> Option<(&'static str, &'static str)> {
    let entry = match key {
        // --- Erros genéricos ---
        "error.generic" => ("Ocorreu um erro inesperado.", "An unexpected error occurred."),
        "error.network" => (
            "Falha de conexão com o servidor. Tente novamente.",
            "Could not reach the server. Please try again.",
        ),
        "error.unauthorized" => (
            "Sessão expirada. Faça login novamente.",
            "Your session has expired. Please sign in again.",
        ),
        "error.forbidden" => (
            "Você não tem permissão para esta ação.",
            "You are not allowed to perform this action.",
        ),
        "error.not_found" => ("Registro não encontrado.", "Record not found."),
        "error.validation" => (
            "Um ou mais campos são inválidos.",
            "One or more fields are invalid.",
        ),
        "error.plan_provider" => (
            "O plano escolhido não pertence à operadora.",
            "The selected plan does not belong to the provider.",
        ),
        "error.channel_closed" => ("O chat foi encerrado.", "The chat has been closed."),

        // --- Sucesso ---
        "success.saved" => ("Registro salvo com sucesso.", "Record saved."),
        "success.removed" => ("Registro excluído.", "Record deleted."),

        // --- Status do agendamento ---
        "status.scheduled" => ("Agendado", "Scheduled"),
        "status.awaiting_payment" => ("Aguardando pagamento", "Awaiting payment"),
        "status.confirmed" => ("Confirmado", "Confirmed"),
        "status.completed" => ("Concluído", "Completed"),
        "status.no_show" => ("Não compareceu", "No-show"),
        "status.cancelled" => ("Cancelado", "Cancelled"),
        "status.unknown" => ("Status desconhecido", "Unknown status"),

        // --- Flags ---
        "flag.first_visit" => ("Primeira consulta", "First visit"),
        "flag.return_visit" => ("Retorno", "Return visit"),
        "flag.paid" => ("Pago", "Paid"),
        "flag.unpaid" => ("Pagamento pendente", "Payment pending"),
        "flag.telehealth" => ("Teleconsulta", "Telehealth"),
        _ => return None,
    };
    Some(entry)
}

pub fn translate(locale: Locale, key: &str) -> String {
    match catalog(key) {
        Some((pt, en)) => match locale {
            Locale::Pt => pt.to_string(),
            Locale::En => en.to_string(),
        },
        // Chave desconhecida: devolve a própria chave
        None => key.to_string(),
    }
}
