//! Prompt composition for analysis and contextual chat.
//!
//! The consultant persona asks the model for the tagged blocks that
//! [`super::parsing`] scrapes back out.

use serde::{Deserialize, Serialize};

use super::document::Document;

/// Depth of the requested analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisLevel {
    /// Executive summary, quick wins
    Basic,
    /// Technical and statistical report
    #[default]
    Medium,
    /// Deep strategy: Pareto, anomalies, tactical actions
    Pro,
    /// Operational-precision report with a roadmap
    Ntu,
}

impl AnalysisLevel {
    fn instructions(self) -> &'static str {
        match self {
            AnalysisLevel::Basic => "Resumen ejecutivo para alta gerencia (Quick Wins).",
            AnalysisLevel::Medium => "Informe técnico y estadístico. Tendencias clave.",
            AnalysisLevel::Pro => "Estrategia profunda. Pareto (80/20), anomalías y acciones tácticas.",
            AnalysisLevel::Ntu => "INFORME NTU: Precisión operacional extrema, organización estructural de datos y hoja de ruta clara.",
        }
    }
}

/// Industry vertical the analysis should focus on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    #[default]
    General,
    Finance,
    Sales,
    Ops,
}

impl Industry {
    fn focus(self) -> &'static str {
        match self {
            Industry::General => "Enfócate en eficiencia global y salud organizacional.",
            Industry::Finance => "Foco crítico en EBITDA, Flujo de Caja, ROE y solvencia. Usa terminología financiera de élite.",
            Industry::Sales => "Foco en CAC, LTV, Tasa de Conversión y Cuota de Mercado. Analiza el embudo de ventas.",
            Industry::Ops => "Foco en Tiempos de Ciclo, Cuellos de Botella, OEE y Cadena de Suministro.",
        }
    }
}

/// How the consultant should approach the documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(default)]
    pub level: AnalysisLevel,
    #[serde(default)]
    pub industry: Industry,
    /// Compare current documents against historical ones
    #[serde(default)]
    pub comparative: bool,
}

const PERSONA: &str = "Eres un Socio Principal de McKinsey especializado en análisis estratégico.";

const COMPARATIVE_NOTE: &str = "IMPORTANTE: Estás en MODO COMPARATIVO. Analiza el 'Archivo Histórico' vs el 'Archivo Actual'. Calcula el DELTA de rendimiento, identifica si hay progreso o retrocesos y explica la causa raíz.";

const OUTPUT_RULES: &str = "MANDATORIO:
1. Comienza con [HEALTH_SCORE: X] (1-100).
2. Sigue con [CRITICAL_FINDINGS] y [GOLD_OPPORTUNITIES], cada hallazgo en una línea que empiece con '-'.
3. INCLUYE UNA SECCIÓN DE 'PROYECCIONES PREDICTIVAS' (Forecasting): Estima el rendimiento a 3, 6 y 12 meses basado en las tendencias actuales.
4. Si detectas una cifra anómala, menciónala explícitamente citando el valor.

Usa un tono empresarial de élite en español. Organiza con títulos (##) y listas.";

/// System prompt for the contextual chat over a finished report.
pub const CHAT_SYSTEM_PROMPT: &str = "Eres un analista experto. Responde preguntas específicas basándote ÚNICAMENTE en el informe proporcionado. Sé breve y preciso. Si la información no está en el informe, indícalo educadamente.";

/// Strategic-consultant system prompt for an analysis run.
pub fn consultant_system_prompt(options: &AnalysisOptions) -> String {
    let mut prompt = format!(
        "{PERSONA} {} Industria: {}",
        options.level.instructions(),
        options.industry.focus()
    );
    if options.comparative {
        prompt.push('\n');
        prompt.push_str(COMPARATIVE_NOTE);
    }
    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_RULES);
    prompt
}

fn document_block(doc: &Document, label: &str) -> String {
    format!("FILE [{label}]: {}\nCONTENT:\n{}", doc.name, doc.excerpt())
}

/// User prompt for an analysis run.
///
/// Historical documents are included only in comparative mode. Each document
/// contributes at most its excerpt.
pub fn analysis_prompt(
    current: &[Document],
    historical: &[Document],
    notes: Option<&str>,
    comparative: bool,
) -> String {
    let mut prompt = current
        .iter()
        .map(|doc| document_block(doc, "ACTUAL"))
        .collect::<Vec<_>>()
        .join("\n\n");

    if comparative {
        prompt.push_str("\n\nDATOS HISTÓRICOS PARA COMPARACIÓN:\n");
        prompt.push_str(
            &historical
                .iter()
                .map(|doc| document_block(doc, "HISTÓRICO"))
                .collect::<Vec<_>>()
                .join("\n\n"),
        );
    }

    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        prompt.push_str("\n\nNOTAS ADICIONALES:\n");
        prompt.push_str(notes);
    }

    prompt
}

/// User prompt for a follow-up question about a report.
pub fn chat_prompt(question: &str, report: &str) -> String {
    format!("INFORME:\n{report}\n\nPREGUNTA DEL USUARIO: {question}")
}
