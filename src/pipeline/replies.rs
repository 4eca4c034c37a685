//! Reply selection per category.
//!
//! For a given category, contextual rules (regex on the raw text) are tried
//! first; otherwise a template is drawn uniformly from the category's set
//! using the caller-supplied RNG. Templates may contain `{preview}`, which
//! expands to the first [`PREVIEW_CHARS`] characters of the email.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::pipeline::types::{Category, ClassificationOutcome};

/// Number of characters of the original text used by `{preview}`.
pub const PREVIEW_CHARS: usize = 20;

/// Reply used when a category has no templates at all.
pub const DEFAULT_REPLY: &str = "Obrigado pelo contato, vamos analisar sua mensagem.";

/// A regex-triggered fixed reply.
#[derive(Debug, Clone)]
pub struct ContextRule {
    pub regex: Regex,
    pub reply: String,
}

/// Reply templates and contextual rules, keyed by category.
#[derive(Debug, Clone)]
pub struct ReplySelector {
    templates: HashMap<Category, Vec<String>>,
    context_rules: HashMap<Category, Vec<ContextRule>>,
}

impl ReplySelector {
    /// Selector with the default Portuguese replies.
    pub fn default_replies() -> Self {
        let mut selector = Self::empty();

        selector.add_template(
            Category::Productive,
            "Olá! Registramos sua solicitação e encaminhamos à equipe responsável.",
        );
        selector.add_template(
            Category::Productive,
            "Obrigado pelo contato. Estamos verificando sua solicitação e retornaremos em breve.",
        );
        selector.add_template(
            Category::Productive,
            "Recebemos sua mensagem \"{preview}...\" e já estamos analisando.",
        );
        selector.add_template(Category::Unproductive, "Agradecemos sua mensagem!");
        selector.add_template(
            Category::Unproductive,
            "Obrigado pela mensagem! Estamos à disposição.",
        );
        selector.add_template(
            Category::Spam,
            "Esta mensagem foi identificada como possível spam e não será respondida.",
        );
        selector.add_template(
            Category::Offensive,
            "Sua mensagem contém conteúdo inadequado e não pode ser processada.",
        );

        selector.context_rules.insert(
            Category::Productive,
            vec![
                ContextRule {
                    regex: Regex::new(r"(?i)acesso|login|senha|reset").unwrap(),
                    reply: "Olá! Recebemos sua solicitação de acesso. Confirme usuário e sistema para agilizar.".into(),
                },
                ContextRule {
                    regex: Regex::new(r"(?i)status|andamento").unwrap(),
                    reply: "Olá! Seu pedido está em análise. Retornaremos com atualização até o fim do dia útil.".into(),
                },
                ContextRule {
                    regex: Regex::new(r"(?i)anexo|arquivo|attachment|pdf").unwrap(),
                    reply: "Olá! Recebemos o arquivo. Vamos validar e retornamos com os próximos passos.".into(),
                },
            ],
        );
        selector.context_rules.insert(
            Category::Unproductive,
            vec![ContextRule {
                regex: Regex::new(r"(?i)feliz natal|parabéns|boas festas").unwrap(),
                reply: "Muito obrigado pelos votos! Desejamos o mesmo para você.".into(),
            }],
        );

        selector
    }

    /// No templates or rules; every category gets [`DEFAULT_REPLY`].
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
            context_rules: HashMap::new(),
        }
    }

    /// Add a template for a category.
    pub fn add_template(&mut self, category: Category, template: &str) {
        self.templates
            .entry(category)
            .or_default()
            .push(template.to_string());
    }

    /// Add a contextual rule for a category.
    pub fn add_context_rule(
        &mut self,
        category: Category,
        pattern: &str,
        reply: &str,
    ) -> Result<(), regex::Error> {
        self.context_rules
            .entry(category)
            .or_default()
            .push(ContextRule {
                regex: Regex::new(pattern)?,
                reply: reply.to_string(),
            });
        Ok(())
    }

    /// Raw templates for a category (before `{preview}` expansion).
    pub fn templates(&self, category: Category) -> &[String] {
        self.templates
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every reply `reply_for` could produce for this category and text.
    pub fn candidates(&self, category: Category, text: &str) -> Vec<String> {
        if let Some(reply) = self.context_reply(category, text) {
            return vec![reply];
        }
        let templates = self.templates(category);
        if templates.is_empty() {
            return vec![DEFAULT_REPLY.to_string()];
        }
        templates.iter().map(|t| render(t, text)).collect()
    }

    /// Pick a reply for a classified email.
    pub fn reply_for<R: Rng + ?Sized>(&self, category: Category, text: &str, rng: &mut R) -> String {
        if let Some(reply) = self.context_reply(category, text) {
            return reply;
        }

        match self.templates(category).choose(rng) {
            Some(template) => render(template, text),
            None => DEFAULT_REPLY.to_string(),
        }
    }

    /// Pick a reply for a decided outcome. Unmatched outcomes always get
    /// [`DEFAULT_REPLY`] and consume no randomness.
    pub fn reply_for_outcome<R: Rng + ?Sized>(
        &self,
        outcome: &ClassificationOutcome,
        text: &str,
        rng: &mut R,
    ) -> String {
        if outcome.is_unmatched() {
            return DEFAULT_REPLY.to_string();
        }
        self.reply_for(outcome.category, text, rng)
    }

    fn context_reply(&self, category: Category, text: &str) -> Option<String> {
        self.context_rules
            .get(&category)?
            .iter()
            .find(|rule| rule.regex.is_match(text))
            .map(|rule| rule.reply.clone())
    }
}

impl Default for ReplySelector {
    fn default() -> Self {
        Self::default_replies()
    }
}

/// Expand `{preview}` in a template.
fn render(template: &str, text: &str) -> String {
    if !template.contains("{preview}") {
        return template.to_string();
    }
    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
    template.replace("{preview}", &preview)
}
