//! # Translation
//!
//! English to Danish ingredient translation for catalog search and scoring.
//!
//! A [`TranslationTable`] is an immutable value handed to the matcher, so tests
//! can inject small fixtures and production code uses [`TranslationTable::danish`].

use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Curated English to Danish vocabulary
const DANISH_TRANSLATIONS: &[(&str, &str)] = &[
    // Vegetables
    ("onion", "løg"),
    ("onions", "løg"),
    ("red onion", "rødløg"),
    ("red onions", "rødløg"),
    ("spring onion", "forårsløg"),
    ("spring onions", "forårsløg"),
    ("green onion", "forårsløg"),
    ("green onions", "forårsløg"),
    ("garlic", "hvidløg"),
    ("tomato", "tomat"),
    ("tomatoes", "tomat"),
    ("canned tomatoes", "hakkede tomater"),
    ("chopped tomatoes", "hakkede tomater"),
    ("potato", "kartoffel"),
    ("potatoes", "kartofler"),
    ("carrot", "gulerod"),
    ("carrots", "gulerødder"),
    ("celery", "selleri"),
    ("lettuce", "salat"),
    ("cucumber", "agurk"),
    ("pepper", "peber"),
    ("black pepper", "sort peber"),
    ("bell pepper", "peberfrugt"),
    ("bell peppers", "peberfrugt"),
    ("mushroom", "champignon"),
    ("mushrooms", "champignon"),
    ("spinach", "spinat"),
    ("broccoli", "broccoli"),
    ("cabbage", "kål"),
    ("leek", "porre"),
    ("shallot", "skalotteløg"),
    ("shallots", "skalotteløg"),
    ("zucchini", "squash"),
    ("courgette", "squash"),
    ("eggplant", "aubergine"),
    ("aubergine", "aubergine"),
    ("avocado", "avocado"),
    ("chili", "chili"),
    // Dairy
    ("milk", "mælk"),
    ("butter", "smør"),
    ("cheese", "ost"),
    ("cream", "fløde"),
    ("heavy cream", "piskefløde"),
    ("whipping cream", "piskefløde"),
    ("cream cheese", "flødeost"),
    ("cottage cheese", "hytteost"),
    ("egg", "æg"),
    ("eggs", "æg"),
    ("yogurt", "yoghurt"),
    ("greek yogurt", "græsk yoghurt"),
    ("sour cream", "creme fraiche"),
    ("parmesan", "parmesan"),
    ("mozzarella", "mozzarella"),
    ("cheddar", "cheddar"),
    // Meat & Fish
    ("chicken", "kylling"),
    ("chicken breast", "kyllingebryst"),
    ("chicken breasts", "kyllingebryst"),
    ("beef", "oksekød"),
    ("pork", "svinekød"),
    ("pork chop", "svinekotelet"),
    ("pork chops", "svinekotelet"),
    ("minced meat", "hakket kød"),
    ("fish", "fisk"),
    ("salmon", "laks"),
    ("cod", "torsk"),
    ("tuna", "tun"),
    ("shrimp", "rejer"),
    ("shrimps", "rejer"),
    ("prawns", "rejer"),
    ("bacon", "bacon"),
    ("ham", "skinke"),
    ("sausage", "pølse"),
    ("sausages", "pølser"),
    ("ground beef", "hakket oksekød"),
    ("minced beef", "hakket oksekød"),
    ("ground pork", "hakket svinekød"),
    // Pantry
    ("flour", "mel"),
    ("all-purpose flour", "hvedemel"),
    ("wheat flour", "hvedemel"),
    ("sugar", "sukker"),
    ("brown sugar", "brun farin"),
    ("salt", "salt"),
    ("olive oil", "olivenolie"),
    ("vegetable oil", "rapsolie"),
    ("sesame oil", "sesamolie"),
    ("oil", "olie"),
    ("pasta", "pasta"),
    ("spaghetti", "spaghetti"),
    ("noodles", "nudler"),
    ("rice", "ris"),
    ("basmati rice", "basmatiris"),
    ("bread", "brød"),
    ("bread crumbs", "rasp"),
    ("breadcrumbs", "rasp"),
    ("tortillas", "tortilla"),
    ("tortilla", "tortilla"),
    ("vinegar", "eddike"),
    ("soy sauce", "sojasauce"),
    ("coconut milk", "kokosmælk"),
    ("baking powder", "bagepulver"),
    ("baking soda", "natron"),
    ("cornstarch", "majsstivelse"),
    ("beans", "bønner"),
    ("kidney beans", "kidneybønner"),
    ("black beans", "sorte bønner"),
    ("chickpeas", "kikærter"),
    ("lentils", "linser"),
    // Fruits
    ("lemon", "citron"),
    ("lemons", "citron"),
    ("lime", "lime"),
    ("limes", "lime"),
    ("apple", "æble"),
    ("apples", "æbler"),
    ("orange", "appelsin"),
    ("oranges", "appelsiner"),
    ("banana", "banan"),
    ("bananas", "bananer"),
    ("strawberries", "jordbær"),
    // Herbs & Spices
    ("parsley", "persille"),
    ("basil", "basilikum"),
    ("thyme", "timian"),
    ("oregano", "oregano"),
    ("rosemary", "rosmarin"),
    ("cilantro", "koriander"),
    ("coriander", "koriander"),
    ("dill", "dild"),
    ("chives", "purløg"),
    ("ginger", "ingefær"),
    ("cinnamon", "kanel"),
    ("paprika", "paprika"),
    ("cumin", "spidskommen"),
    ("nutmeg", "muskatnød"),
    ("bay leaf", "laurbærblad"),
    ("bay leaves", "laurbærblade"),
    // Beverages
    ("wine", "vin"),
    ("white wine", "hvidvin"),
    ("red wine", "rødvin"),
    ("dry white wine", "hvidvin"),
    ("beer", "øl"),
    ("water", "vand"),
    // Other
    ("stock", "bouillon"),
    ("broth", "bouillon"),
    ("chicken stock", "kyllingebouillon"),
    ("beef stock", "oksebouillon"),
    ("vegetable stock", "grøntsagsbouillon"),
    ("honey", "honning"),
    ("mustard", "sennep"),
    ("mayonnaise", "mayonnaise"),
    ("ketchup", "ketchup"),
    // Colours and qualifiers that survive per-word translation
    ("red", "rød"),
    ("green", "grøn"),
    ("yellow", "gul"),
    ("white", "hvid"),
];

/// Preparation and size words that do not help a catalog search
const DESCRIPTORS: &[&str] = &[
    "fresh", "dried", "frozen", "organic", "large", "small", "medium", "chopped", "diced",
    "minced", "sliced", "grated", "crushed", "whole", "ground", "powdered", "raw", "cooked",
    "ripe", "finely", "roughly", "peeled", "lean", "boneless", "skinless", "frisk", "friske",
    "tørret", "tørrede", "frosset", "frosne", "økologisk", "økologiske", "stor", "store",
    "lille", "små", "hakket", "hakkede", "skåret", "revet", "knust", "knuste", "hel", "hele",
    "malet", "rå", "kogt", "kogte", "fint", "groft",
];

/// How a name was translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationKind {
    /// Already Danish, passed through
    Native,
    /// At least one multi-word phrase was translated
    Phrase,
    /// Only single words were translated
    PerWord,
    /// Nothing in the table applied
    Untranslated,
}

/// A translated ingredient name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    pub kind: TranslationKind,
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Immutable phrase table used for translation
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: HashMap<String, String>,
    native_words: HashSet<String>,
    max_phrase_words: usize,
}

/// Split a name into lower-case words without surrounding punctuation
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '&')
                .to_string()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Check whether a word only describes preparation or size
pub fn is_descriptor(word: &str) -> bool {
    DESCRIPTORS.contains(&word)
}

/// Drop descriptor words, keeping the name if nothing else remains
pub fn clean_ingredient_name(name: &str) -> String {
    let words = tokenize(name);
    let cleaned: Vec<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|w| !is_descriptor(w))
        .collect();
    if cleaned.is_empty() {
        words.join(" ")
    } else {
        cleaned.join(" ")
    }
}

impl TranslationTable {
    /// The curated English to Danish table
    pub fn danish() -> Self {
        Self::from_pairs(DANISH_TRANSLATIONS.iter().copied())
    }

    /// Build a table from (english, danish) pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut table = Self::default();
        for (english, danish) in pairs {
            let english = tokenize(english.as_ref()).join(" ");
            let danish = danish.as_ref().trim().to_lowercase();
            if english.is_empty() || danish.is_empty() {
                continue;
            }
            table.max_phrase_words = table.max_phrase_words.max(english.split(' ').count());
            table
                .native_words
                .extend(danish.split_whitespace().map(str::to_string));
            table.entries.insert(english, danish);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an exact phrase
    pub fn lookup(&self, phrase: &str) -> Option<&str> {
        self.entries
            .get(&tokenize(phrase).join(" "))
            .map(String::as_str)
    }

    fn is_native_word(&self, word: &str) -> bool {
        if word.contains(['æ', 'ø', 'å']) {
            return true;
        }
        if let Some(translation) = self.entries.get(word) {
            // Words like "salt" or "pasta" are the same in both languages
            return translation == word;
        }
        self.native_words.contains(word) || (is_descriptor(word) && !word.is_ascii())
    }

    /// Check whether text uses words that only exist in Danish.
    ///
    /// Words spelled the same in both languages ("salt", "pasta") do not count.
    pub fn mentions_native(&self, text: &str) -> bool {
        tokenize(text).iter().any(|word| {
            word.contains(['æ', 'ø', 'å'])
                || (self.native_words.contains(word.as_str()) && !self.entries.contains_key(word))
        })
    }

    /// Check whether a name is already Danish
    pub fn is_native(&self, name: &str) -> bool {
        let words = tokenize(name);
        !words.is_empty() && words.iter().all(|w| self.is_native_word(w) || is_descriptor(w))
            && words.iter().any(|w| self.is_native_word(w))
    }

    /// Translate a name, longest phrase first with per-word fallback
    pub fn translate(&self, name: &str) -> Translation {
        let words = tokenize(name);
        if words.is_empty() {
            return Translation {
                text: name.trim().to_lowercase(),
                kind: TranslationKind::Untranslated,
            };
        }

        if self.is_native(name) {
            return Translation {
                text: words.join(" "),
                kind: TranslationKind::Native,
            };
        }

        // (word, translated)
        let mut output: Vec<(&str, bool)> = Vec::new();
        let mut used_phrase = false;
        let mut used_word = false;
        let mut index = 0;

        'words: while index < words.len() {
            let longest = self.max_phrase_words.min(words.len() - index);
            for length in (1..=longest).rev() {
                let phrase = words[index..index + length].join(" ");
                if let Some(danish) = self.entries.get(&phrase) {
                    output.push((danish.as_str(), true));
                    if length > 1 {
                        used_phrase = true;
                    } else {
                        used_word = true;
                    }
                    index += length;
                    continue 'words;
                }
            }
            output.push((words[index].as_str(), false));
            index += 1;
        }

        let translation = if used_phrase || used_word {
            let kept: Vec<&str> = output
                .into_iter()
                .filter(|(word, translated)| *translated || !is_descriptor(word))
                .map(|(word, _)| word)
                .collect();
            Translation {
                text: kept.join(" "),
                kind: if used_phrase {
                    TranslationKind::Phrase
                } else {
                    TranslationKind::PerWord
                },
            }
        } else {
            Translation {
                text: words.join(" "),
                kind: TranslationKind::Untranslated,
            }
        };

        trace!("Translated '{}' -> '{}' ({:?})", name, translation.text, translation.kind);
        translation
    }

    /// Catalog queries to try for an ingredient, best first and without duplicates
    pub fn search_queries(&self, name: &str) -> Vec<String> {
        let mut queries: Vec<String> = Vec::new();
        let mut push = |query: String| {
            let query = query.trim().to_string();
            if !query.is_empty() && !queries.contains(&query) {
                queries.push(query);
            }
        };

        let translation = self.translate(name);
        if translation.kind != TranslationKind::Untranslated {
            push(translation.text.clone());
        }

        let cleaned = clean_ingredient_name(name);
        push(cleaned.clone());
        push(tokenize(name).join(" "));

        let cleaned_words: Vec<&str> = cleaned.split_whitespace().collect();
        if cleaned_words.len() > 1 {
            let first = cleaned_words[0];
            if let Some(danish) = self.lookup(first) {
                push(danish.to_string());
            }
            push(first.to_string());
        }

        queries
    }
}
