//! # Technical Conclusion
//!
//! Closes a memorial with a short technical opinion followed by the summary
//! table. The opinion text comes from an external text generator behind the
//! [`TextGenerator`] trait; this module builds the instruction text and
//! places the result.
//!
//! ## Example
//!
//! ```rust
//! use memorial_core::conclusion::{OfflineGenerator, FALLBACK_CONCLUSION};
//! use memorial_core::memorial::{BlockKind, ComparisonData, Memorial};
//!
//! let mut memorial = Memorial::new("Projeto");
//! memorial.add_block(BlockKind::Comparison(ComparisonData::projecting(15.0)), None).unwrap();
//!
//! memorial.append_conclusion(&OfflineGenerator).unwrap();
//! let last = memorial.pages.last().unwrap().blocks.last().unwrap();
//! assert_eq!(last.kind, BlockKind::SummaryTable);
//! ```

use uuid::Uuid;

use crate::calculations::summary::ProjectSummary;
use crate::catalog::format_cv;
use crate::errors::{CalcError, CalcResult};
use crate::memorial::{Block, BlockKind, Memorial, TextAlign};

/// Used when the generator returns nothing usable.
pub const FALLBACK_CONCLUSION: &str = "Dimensionamento técnico concluído com sucesso.";

/// Heading prepended to the generated opinion.
pub const CONCLUSION_PREFIX: &str = "PARECER TÉCNICO";

/// Source of free text for the conclusion (a generative-text service, a
/// template, a human).
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> CalcResult<String>;
}

/// Generator for offline use; always yields the fallback conclusion.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    fn generate(&self, _prompt: &str) -> CalcResult<String> {
        Ok(String::new())
    }
}

/// Instruction text sent to the generator.
pub fn build_prompt(summary: &ProjectSummary) -> String {
    format!(
        "Como um consultor técnico sênior, escreva uma conclusão técnica curta \
         (máximo 4 linhas) sobre este projeto. Contempla {count} motores WEG IE3 Premium, \
         potência total {cv} CV ({kw:.1} kW), corrente nominal total {current:.1} A, \
         {breaker}. Foque na redução de custos e conformidade normativa.",
        count = summary.motor_count,
        cv = format_cv(summary.total_cv),
        kw = summary.total_kw,
        current = summary.total_in_a,
        breaker = summary.recommended_main_breaker,
    )
}

/// What [`Memorial::append_conclusion`] added.
#[derive(Debug, Clone, PartialEq)]
pub struct ConclusionOutcome {
    /// Opinion text block; `None` when the generator failed
    pub opinion_id: Option<Uuid>,
    pub summary_table_id: Uuid,
    /// Generator error the conclusion degraded past
    pub generation_error: Option<CalcError>,
}

impl ConclusionOutcome {
    pub fn is_degraded(&self) -> bool {
        self.generation_error.is_some()
    }
}

impl Memorial {
    /// Generate the technical opinion and append it, plus a summary table,
    /// to the last page.
    ///
    /// # Arguments
    ///
    /// * `generator` - Source of the opinion text
    ///
    /// # Returns
    ///
    /// * `Ok(ConclusionOutcome)` - Ids of the appended blocks. When the generator
    ///   fails, only the summary table is appended and the error is carried in
    ///   `generation_error`.
    /// * `Err(CalcError)` - The memorial is locked or has no catalogued projected
    ///   motor; nothing is appended
    pub fn append_conclusion(
        &mut self,
        generator: &dyn TextGenerator,
    ) -> CalcResult<ConclusionOutcome> {
        if self.locked {
            return Err(CalcError::document_locked("append conclusion"));
        }

        let summary = self.summary();
        if summary.motor_count == 0 {
            return Err(CalcError::invalid_input(
                "motors",
                "0",
                "Adicione ao menos um motor para gerar o relatório.",
            ));
        }

        let prompt = build_prompt(&summary);
        tracing::debug!(motor_count = summary.motor_count, "requesting conclusion text");

        let (opinion_id, generation_error) = match generator.generate(&prompt) {
            Ok(generated) => {
                let text = match generated.trim() {
                    "" => FALLBACK_CONCLUSION,
                    trimmed => trimmed,
                };
                let opinion = Block::text(format!("{}: {}", CONCLUSION_PREFIX, text))
                    .with_font_size(10.0)
                    .bold()
                    .italic()
                    .aligned(TextAlign::Justify);
                (Some(self.insert_block(opinion, None)?), None)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "conclusion text unavailable, appending summary table only"
                );
                (None, Some(err))
            }
        };
        let summary_table_id = self.insert_block(Block::new(BlockKind::SummaryTable), None)?;

        tracing::info!(motor_count = summary.motor_count, "conclusion appended");
        Ok(ConclusionOutcome {
            opinion_id,
            summary_table_id,
            generation_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memorial::ComparisonData;
    use crate::policy::DimensioningPolicy;
    use std::cell::RefCell;

    struct Recording {
        reply: String,
        prompts: RefCell<Vec<String>>,
    }

    impl TextGenerator for Recording {
        fn generate(&self, prompt: &str) -> CalcResult<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct Failing;

    impl TextGenerator for Failing {
        fn generate(&self, _prompt: &str) -> CalcResult<String> {
            Err(CalcError::GenerationFailed {
                reason: "service unavailable".to_string(),
            })
        }
    }

    fn memorial_with(cvs: &[f64]) -> Memorial {
        let mut memorial = Memorial::new("Projeto");
        for &cv in cvs {
            memorial
                .add_block(BlockKind::Comparison(ComparisonData::projecting(cv)), None)
                .unwrap();
        }
        memorial
    }

    fn text_of(block: &Block) -> &str {
        match &block.kind {
            BlockKind::Text(text) => text,
            other => panic!("expected text block, got {:?}", other),
        }
    }

    #[test]
    fn test_prompt_mentions_totals() {
        let motors = crate::catalog::resolve_all([10.0, 7.5]);
        let summary = crate::calculations::summarize(&motors, &DimensioningPolicy::default());
        let prompt = build_prompt(&summary);
        assert!(prompt.contains("2 motores"));
        assert!(prompt.contains("17.5 CV"));
        assert!(prompt.contains("Disjuntor Geral"));
    }

    #[test]
    fn test_append_uses_generated_text() {
        let mut memorial = memorial_with(&[10.0, 20.0]);
        let generator = Recording {
            reply: "  Projeto em conformidade.  ".to_string(),
            prompts: RefCell::new(Vec::new()),
        };
        let outcome = memorial.append_conclusion(&generator).unwrap();
        assert!(!outcome.is_degraded());

        let block = memorial.block(outcome.opinion_id.unwrap()).unwrap();
        assert_eq!(text_of(block), "PARECER TÉCNICO: Projeto em conformidade.");
        assert!(block.bold && block.italic);
        assert_eq!(block.align, TextAlign::Justify);
        assert_eq!(generator.prompts.borrow().len(), 1);

        let blocks = &memorial.pages.last().unwrap().blocks;
        assert_eq!(blocks.last().unwrap().kind, BlockKind::SummaryTable);
        assert_eq!(blocks.last().unwrap().id, outcome.summary_table_id);
    }

    #[test]
    fn test_blank_output_falls_back() {
        let mut memorial = memorial_with(&[5.0]);
        let outcome = memorial.append_conclusion(&OfflineGenerator).unwrap();
        assert_eq!(
            text_of(memorial.block(outcome.opinion_id.unwrap()).unwrap()),
            format!("PARECER TÉCNICO: {}", FALLBACK_CONCLUSION)
        );
    }

    #[test]
    fn test_requires_a_motor() {
        let mut memorial = memorial_with(&[9999.0]);
        let before = memorial.blocks().count();
        let err = memorial.append_conclusion(&OfflineGenerator).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(memorial.blocks().count(), before);
    }

    #[test]
    fn test_generator_failure_still_appends_summary_table() {
        let mut memorial = memorial_with(&[5.0]);
        let before = memorial.blocks().count();
        let outcome = memorial.append_conclusion(&Failing).unwrap();

        assert!(outcome.is_degraded());
        assert!(outcome.opinion_id.is_none());
        assert!(outcome.generation_error.as_ref().unwrap().is_recoverable());

        assert_eq!(memorial.blocks().count(), before + 1);
        let last = memorial.pages.last().unwrap().blocks.last().unwrap();
        assert_eq!(last.kind, BlockKind::SummaryTable);
        assert_eq!(last.id, outcome.summary_table_id);
        assert!(!memorial
            .blocks()
            .any(|b| matches!(&b.kind, BlockKind::Text(t) if t.starts_with(CONCLUSION_PREFIX))));
    }

    #[test]
    fn test_locked_memorial() {
        let mut memorial = memorial_with(&[5.0]);
        memorial.set_locked(true);
        assert!(memorial.append_conclusion(&OfflineGenerator).is_err());
    }
}
