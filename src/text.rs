//! Text normalization for the keyword stage.
//!
//! Lowercases, strips ASCII punctuation and drops Portuguese stopwords.
//! Providers never see the normalized form; they get the raw text.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Portuguese stopword list (the NLTK `stopwords.words("portuguese")` corpus).
static PORTUGUESE_STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "a", "à", "ao", "aos", "aquela", "aquelas", "aquele", "aqueles", "aquilo", "as", "às",
        "até", "com", "como", "da", "das", "de", "dela", "delas", "dele", "deles", "depois",
        "do", "dos", "e", "é", "ela", "elas", "ele", "eles", "em", "entre", "era", "eram",
        "éramos", "essa", "essas", "esse", "esses", "esta", "está", "estamos", "estão", "estar",
        "estas", "estava", "estavam", "estávamos", "este", "esteja", "estejam", "estejamos",
        "estes", "esteve", "estive", "estivemos", "estiver", "estivera", "estiveram",
        "estivéramos", "estiverem", "estivermos", "estivesse", "estivessem", "estivéssemos",
        "estou", "eu", "foi", "fomos", "for", "fora", "foram", "fôramos", "forem", "formos",
        "fosse", "fossem", "fôssemos", "fui", "há", "haja", "hajam", "hajamos", "hão",
        "havemos", "haver", "hei", "houve", "houvemos", "houver", "houvera", "houverá",
        "houveram", "houvéramos", "houverão", "houverei", "houverem", "houveremos", "houveria",
        "houveriam", "houveríamos", "houvermos", "houvesse", "houvessem", "houvéssemos", "isso",
        "isto", "já", "lhe", "lhes", "mais", "mas", "me", "mesmo", "meu", "meus", "minha",
        "minhas", "muito", "na", "não", "nas", "nem", "no", "nos", "nós", "nossa", "nossas",
        "nosso", "nossos", "num", "numa", "o", "os", "ou", "para", "pela", "pelas", "pelo",
        "pelos", "por", "qual", "quando", "que", "quem", "são", "se", "seja", "sejam",
        "sejamos", "sem", "ser", "será", "serão", "serei", "seremos", "seria", "seriam",
        "seríamos", "seu", "seus", "só", "somos", "sou", "sua", "suas", "também", "te", "tem",
        "tém", "temos", "tenha", "tenham", "tenhamos", "tenho", "terá", "terão", "terei",
        "teremos", "teria", "teriam", "teríamos", "teu", "teus", "teve", "tinha", "tinham",
        "tínhamos", "tive", "tivemos", "tiver", "tivera", "tiveram", "tivéramos", "tiverem",
        "tivermos", "tivesse", "tivessem", "tivéssemos", "tu", "tua", "tuas", "um", "uma",
        "você", "vocês", "vos",
    ])
});

/// Whether `word` is in the Portuguese stopword set. Expects lowercase input.
pub fn is_stopword(word: &str) -> bool {
    PORTUGUESE_STOPWORDS.contains(word)
}

/// Normalize text for keyword matching.
///
/// Only ASCII punctuation is stripped, so accented letters survive.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    stripped
        .split_whitespace()
        .filter(|word| !is_stopword(word))
        .collect::<Vec<_>>()
        .join(" ")
}
