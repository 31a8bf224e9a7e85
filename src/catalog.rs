//! # Catalog Model
//!
//! Read-only grocery catalog records, the classifications the matcher scores
//! against, and the [`CatalogSearch`] port through which candidates arrive.
//!
//! Vendor data is normalized once at ingestion: label strings become
//! [`ProductLabel`]s and pack descriptions become [`ParsedUnit`]s. The matcher
//! only ever sees the normalized [`CatalogCandidate`].

use crate::errors::SearchError;
use crate::translation::tokenize;
use crate::units::{parse_pack_size, BaseUnit, ParsedUnit};
use anyhow::{Context, Result};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Product labels the matcher filters and boosts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductLabel {
    Organic,
    LactoseFree,
    GlutenFree,
    Vegan,
    OnSale,
}

impl ProductLabel {
    /// Read a vendor label string ("Økologisk", "Laktosefri", ...)
    pub fn from_vendor_label(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        if label.contains("øko") || label.contains("organic") {
            Some(ProductLabel::Organic)
        } else if label.contains("laktosefri") || label.contains("lactose") {
            Some(ProductLabel::LactoseFree)
        } else if label.contains("glutenfri") || label.contains("gluten") {
            Some(ProductLabel::GlutenFree)
        } else if label.contains("vegan") {
            Some(ProductLabel::Vegan)
        } else if label.contains("tilbud") || label.contains("sale") || label.contains("discount") {
            Some(ProductLabel::OnSale)
        } else {
            None
        }
    }
}

/// Name words that mark a product as plant-based
const PLANT_BASED_INDICATORS: &[&str] = &["vegan", "vegansk", "plantebaseret", "plant-based"];

const VEGETARIAN_INDICATORS: &[&str] = &[
    "vegetar", "vegetarian", "vegetarisk", "veggie", "vegan", "vegansk", "plantebaseret",
    "plant-based",
];

const LACTOSE_FREE_INDICATORS: &[&str] = &["laktosefri", "lactose-free", "lactose free"];

const GLUTEN_FREE_INDICATORS: &[&str] = &["glutenfri", "gluten-free", "gluten free"];

/// Plant drinks that borrow dairy words
const DAIRY_FREE_INDICATORS: &[&str] = &[
    "vegan", "vegansk", "plantebaseret", "plant-based", "kokosmælk", "havredrik", "sojadrik",
    "mandeldrik", "risdrik",
];

const MEAT_TERMS: &[&str] = &[
    "kød", "oksekød", "svinekød", "kalvekød", "lammekød", "kylling", "kalkun", "andebryst", "gås",
    "lam", "vildt", "bacon", "skinke", "pølse", "pølser", "leverpostej", "paté", "frikadelle",
    "meat", "beef", "pork", "chicken", "turkey", "duck", "lamb", "ham", "sausage", "salami",
    "pepperoni", "gelatine", "gelatin",
];

const MEAT_AND_FISH_TERMS: &[&str] = &[
    "kød", "oksekød", "svinekød", "kalvekød", "lammekød", "kylling", "kalkun", "andebryst", "gås",
    "lam", "vildt", "bacon", "skinke", "pølse", "pølser", "leverpostej", "paté", "frikadelle",
    "meat", "beef", "pork", "chicken", "turkey", "duck", "lamb", "ham", "sausage", "salami",
    "pepperoni", "gelatine", "gelatin", "fisk", "laks", "torsk", "tun", "rejer", "fish", "salmon",
    "shrimp", "tuna", "ansjoser", "anchovy",
];

/// Lower-cased words of a product's name and department
fn product_tokens(candidate: &CatalogCandidate) -> Vec<String> {
    tokenize(&format!("{} {}", candidate.name, candidate.category))
}

/// Does a product word list contain a term, tolerating Danish compounds.
///
/// Terms of three letters or more also match word starts ("rug" in "rugbrød"),
/// terms of four or more also match word ends ("mælk" in "letmælk").
fn contains_term(tokens: &[String], term: &str) -> bool {
    if term.contains(' ') {
        return tokens.join(" ").contains(term);
    }
    let length = term.chars().count();
    tokens.iter().any(|token| {
        token == term
            || (length >= 3 && token.starts_with(term))
            || (length >= 4 && token.ends_with(term))
    })
}

fn first_term<'a>(tokens: &[String], terms: &[&'a str]) -> Option<&'a str> {
    terms.iter().copied().find(|term| contains_term(tokens, term))
}

/// Why a product fails a dietary requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DietaryConflict {
    /// Neither the label nor a name marker says the product qualifies
    MissingLabel,
    /// The product names something the diet excludes
    Contains(&'static str),
}

/// Dietary requirements.
///
/// Lactose-free, gluten-free and vegan are strict: a product needs the label or
/// a marker in its name. Vegetarian and pescatarian exclude products whose name
/// or department mentions meat (and fish, for vegetarians) unless the name
/// marks them as vegetarian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryFilter {
    LactoseFree,
    GlutenFree,
    Vegan,
    Vegetarian,
    Pescatarian,
}

impl DietaryFilter {
    /// Labels that satisfy the requirement outright
    pub fn safe_labels(&self) -> &'static [ProductLabel] {
        match self {
            DietaryFilter::LactoseFree => &[ProductLabel::LactoseFree],
            DietaryFilter::GlutenFree => &[ProductLabel::GlutenFree],
            DietaryFilter::Vegan | DietaryFilter::Vegetarian | DietaryFilter::Pescatarian => {
                &[ProductLabel::Vegan]
            }
        }
    }

    /// Name words that satisfy the requirement outright
    pub fn safe_indicators(&self) -> &'static [&'static str] {
        match self {
            DietaryFilter::LactoseFree => LACTOSE_FREE_INDICATORS,
            DietaryFilter::GlutenFree => GLUTEN_FREE_INDICATORS,
            DietaryFilter::Vegan => PLANT_BASED_INDICATORS,
            DietaryFilter::Vegetarian | DietaryFilter::Pescatarian => VEGETARIAN_INDICATORS,
        }
    }

    /// Terms that rule a product out, for the keyword-screened diets
    pub fn excluded_terms(&self) -> &'static [&'static str] {
        match self {
            DietaryFilter::Vegetarian => MEAT_AND_FISH_TERMS,
            DietaryFilter::Pescatarian => MEAT_TERMS,
            _ => &[],
        }
    }

    /// Whether only a label or name marker lets a product through
    pub fn is_strict(&self) -> bool {
        matches!(
            self,
            DietaryFilter::LactoseFree | DietaryFilter::GlutenFree | DietaryFilter::Vegan
        )
    }

    /// Check a product against the requirement
    pub fn conflict(&self, candidate: &CatalogCandidate) -> Option<DietaryConflict> {
        if self.safe_labels().iter().any(|label| candidate.has_label(*label)) {
            return None;
        }
        let name_tokens = tokenize(&candidate.name);
        if first_term(&name_tokens, self.safe_indicators()).is_some() {
            return None;
        }
        if self.is_strict() {
            return Some(DietaryConflict::MissingLabel);
        }
        first_term(&product_tokens(candidate), self.excluded_terms()).map(DietaryConflict::Contains)
    }
}

impl FromStr for DietaryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "lactose-free" | "lactose" | "laktosefri" => Ok(DietaryFilter::LactoseFree),
            "gluten-free" | "gluten" | "glutenfri" => Ok(DietaryFilter::GlutenFree),
            "vegan" | "vegansk" => Ok(DietaryFilter::Vegan),
            "vegetarian" | "vegetar" | "vegetarisk" => Ok(DietaryFilter::Vegetarian),
            "pescatarian" | "pescetarian" | "pescetar" | "pescetarisk" => {
                Ok(DietaryFilter::Pescatarian)
            }
            other => Err(format!("unknown dietary filter '{}'", other)),
        }
    }
}

impl fmt::Display for DietaryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DietaryFilter::LactoseFree => "lactose-free",
            DietaryFilter::GlutenFree => "gluten-free",
            DietaryFilter::Vegan => "vegan",
            DietaryFilter::Vegetarian => "vegetarian",
            DietaryFilter::Pescatarian => "pescatarian",
        };
        write!(f, "{}", name)
    }
}

/// Allergens screened by keyword in product names and departments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Allergen {
    Lactose,
    Dairy,
    Gluten,
    Nuts,
    Shellfish,
    Fish,
    Eggs,
    Soy,
    Sesame,
    Celery,
    Mustard,
}

impl Allergen {
    /// Danish and English words that reveal the allergen
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Allergen::Lactose => &["laktose", "lactose", "mælk", "fløde", "milk", "cream"],
            Allergen::Dairy => &[
                "mælk", "fløde", "ost", "flødeost", "hytteost", "smør", "yoghurt", "skyr",
                "creme fraiche", "cremefraiche", "mascarpone", "ricotta", "mozzarella",
                "parmesan", "feta", "valle", "kasein", "milk", "cream", "cheese", "butter",
                "yogurt", "whey", "casein",
            ],
            Allergen::Gluten => &[
                "hvede", "rug", "byg", "havre", "gluten", "semulje", "wheat", "rye", "barley",
                "oat", "seitan", "bulgur", "couscous", "semolina",
            ],
            Allergen::Nuts => &[
                "nød", "nødder", "mandel", "mandler", "hasselnød", "valnød", "cashew", "pistacie",
                "jordnød", "peanut", "nut", "almond", "walnut", "hazelnut", "pecan", "macadamia",
            ],
            Allergen::Shellfish => &[
                "rejer", "reje", "hummer", "krabbe", "musling", "østers", "shrimp", "prawn",
                "lobster", "crab", "mussel", "oyster", "scallop", "clam", "crayfish",
            ],
            Allergen::Fish => &[
                "fisk", "laks", "torsk", "tun", "makrel", "sild", "ål", "rødspætte", "ansjos",
                "sardin", "fish", "salmon", "cod", "tuna", "mackerel", "herring", "anchovy",
                "sardine",
            ],
            Allergen::Eggs => &[
                "æg", "æggehvide", "æggeblomme", "egg", "eggs", "albumin", "mayonnaise", "mayo",
            ],
            Allergen::Soy => &["soja", "soy", "tofu", "edamame", "miso", "tempeh"],
            Allergen::Sesame => &["sesam", "sesame", "tahini"],
            Allergen::Celery => &["selleri", "celery", "celeriac", "knoldselleri"],
            Allergen::Mustard => &["sennep", "mustard"],
        }
    }

    /// Labels under which a product is free of the allergen
    fn safe_labels(&self) -> &'static [ProductLabel] {
        match self {
            Allergen::Lactose => &[ProductLabel::LactoseFree, ProductLabel::Vegan],
            Allergen::Gluten => &[ProductLabel::GlutenFree],
            Allergen::Dairy | Allergen::Eggs => &[ProductLabel::Vegan],
            _ => &[],
        }
    }

    /// Name words under which a product is free of the allergen
    fn safe_indicators(&self) -> &'static [&'static str] {
        match self {
            Allergen::Lactose => LACTOSE_FREE_INDICATORS,
            Allergen::Gluten => GLUTEN_FREE_INDICATORS,
            Allergen::Dairy => DAIRY_FREE_INDICATORS,
            Allergen::Eggs => PLANT_BASED_INDICATORS,
            _ => &[],
        }
    }

    /// The keyword that flags a product, if any
    pub fn found_in(&self, candidate: &CatalogCandidate) -> Option<&'static str> {
        if self.safe_labels().iter().any(|label| candidate.has_label(*label)) {
            return None;
        }
        let name_tokens = tokenize(&candidate.name);
        let marked_safe = first_term(&name_tokens, self.safe_indicators()).is_some()
            || (*self == Allergen::Lactose
                && first_term(&name_tokens, DAIRY_FREE_INDICATORS).is_some());
        if marked_safe {
            return None;
        }
        first_term(&product_tokens(candidate), self.keywords())
    }
}

impl FromStr for Allergen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lactose" | "laktose" => Ok(Allergen::Lactose),
            "dairy" | "mejeri" | "mælk" | "milk" => Ok(Allergen::Dairy),
            "gluten" => Ok(Allergen::Gluten),
            "nuts" | "nut" | "nødder" | "nød" => Ok(Allergen::Nuts),
            "shellfish" | "skaldyr" => Ok(Allergen::Shellfish),
            "fish" | "fisk" => Ok(Allergen::Fish),
            "eggs" | "egg" | "æg" => Ok(Allergen::Eggs),
            "soy" | "soja" => Ok(Allergen::Soy),
            "sesame" | "sesam" => Ok(Allergen::Sesame),
            "celery" | "selleri" => Ok(Allergen::Celery),
            "mustard" | "sennep" => Ok(Allergen::Mustard),
            other => Err(format!("unknown allergen '{}'", other)),
        }
    }
}

impl fmt::Display for Allergen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Allergen::Lactose => "lactose",
            Allergen::Dairy => "dairy",
            Allergen::Gluten => "gluten",
            Allergen::Nuts => "nuts",
            Allergen::Shellfish => "shellfish",
            Allergen::Fish => "fish",
            Allergen::Eggs => "eggs",
            Allergen::Soy => "soy",
            Allergen::Sesame => "sesame",
            Allergen::Celery => "celery",
            Allergen::Mustard => "mustard",
        };
        write!(f, "{}", name)
    }
}

/// Search word that steers a vendor search toward safe products.
///
/// Allergies are considered before diets; the first one with a prefix wins.
pub fn safe_alternative_prefix(
    allergies: &BTreeSet<Allergen>,
    filters: &BTreeSet<DietaryFilter>,
) -> Option<&'static str> {
    let from_allergy = allergies.iter().find_map(|allergen| match allergen {
        Allergen::Lactose | Allergen::Dairy => Some("laktosefri"),
        Allergen::Gluten => Some("glutenfri"),
        _ => None,
    });
    from_allergy.or_else(|| {
        filters.iter().find_map(|filter| match filter {
            DietaryFilter::LactoseFree => Some("laktosefri"),
            DietaryFilter::GlutenFree => Some("glutenfri"),
            DietaryFilter::Vegan => Some("vegansk"),
            DietaryFilter::Vegetarian => Some("vegetar"),
            DietaryFilter::Pescatarian => None,
        })
    })
}

/// Cuisine a recipe belongs to, used to disambiguate generic ingredients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MealContext {
    Mexican,
    Italian,
    Asian,
    Indian,
}

/// Ambiguous ingredient terms and the product keywords a cuisine prefers for them
type ContextPreference = (&'static [&'static str], &'static [&'static str]);

const MEXICAN_PREFERENCES: &[ContextPreference] = &[
    (
        &["ost", "cheese"],
        &["revet", "cheddar", "mozzarella", "tex mex", "taco", "shredded", "mexican"],
    ),
    (
        &["bønner", "beans"],
        &["kidney", "sorte", "black", "refried", "chili"],
    ),
    (
        &["tortilla", "tortillas"],
        &["hvede", "majs", "wrap", "flour", "corn"],
    ),
];

const ITALIAN_PREFERENCES: &[ContextPreference] = &[
    (
        &["ost", "cheese"],
        &["parmesan", "parmigiano", "grana padano", "pecorino", "mozzarella"],
    ),
    (
        &["tomat", "tomater", "tomato", "tomatoes"],
        &["flåede", "passata", "san marzano", "hakkede", "peeled"],
    ),
    (
        &["pasta"],
        &["spaghetti", "penne", "rigatoni", "tagliatelle", "fusilli"],
    ),
    (
        &["olie", "oil", "olivenolie"],
        &["ekstra jomfru", "extra virgin"],
    ),
];

const ASIAN_PREFERENCES: &[ContextPreference] = &[
    (
        &["nudler", "noodles"],
        &["ægnudler", "risnudler", "udon", "ramen", "egg noodles", "rice noodles"],
    ),
    (&["olie", "oil"], &["sesam", "sesame"]),
    (&["ris", "rice"], &["jasmin", "jasmine", "sushi"]),
    (&["sauce"], &["soja", "soy", "østers", "oyster", "fiske"]),
];

const INDIAN_PREFERENCES: &[ContextPreference] = &[
    (&["ris", "rice"], &["basmati"]),
    (&["ost", "cheese"], &["paneer"]),
    (&["brød", "bread"], &["naan"]),
    (&["yoghurt", "yogurt"], &["græsk", "naturel", "natural", "plain"]),
];

impl MealContext {
    /// The cuisine's ambiguous terms and preferred product keywords
    pub fn preferences(&self) -> &'static [ContextPreference] {
        match self {
            MealContext::Mexican => MEXICAN_PREFERENCES,
            MealContext::Italian => ITALIAN_PREFERENCES,
            MealContext::Asian => ASIAN_PREFERENCES,
            MealContext::Indian => INDIAN_PREFERENCES,
        }
    }
}

impl FromStr for MealContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mexican" | "mexicansk" | "mexicanske" | "tex-mex" | "tex mex" => {
                Ok(MealContext::Mexican)
            }
            "italian" | "italiensk" | "italienske" => Ok(MealContext::Italian),
            "asian" | "asiatisk" | "asiatiske" => Ok(MealContext::Asian),
            "indian" | "indisk" | "indiske" => Ok(MealContext::Indian),
            other => Err(format!("unknown meal context '{}'", other)),
        }
    }
}

impl fmt::Display for MealContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MealContext::Mexican => "mexican",
            MealContext::Italian => "italian",
            MealContext::Asian => "asian",
            MealContext::Indian => "indian",
        };
        write!(f, "{}", name)
    }
}

/// Broad catalog department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryClass {
    Produce,
    Dairy,
    Meat,
    Fish,
    Bakery,
    Frozen,
    Beverages,
    Pantry,
    Snack,
    NonFood,
    Unknown,
}

/// Vendor category words per class, checked in this order
const CATEGORY_KEYWORDS: &[(CategoryClass, &[&str])] = &[
    (
        CategoryClass::NonFood,
        &[
            "husholdning", "pleje", "rengøring", "baby", "dyremad", "apotek", "household",
            "cleaning", "kitchenware", "køkkenudstyr", "personal care", "pet", "pharmacy",
            "non-food",
        ],
    ),
    (
        CategoryClass::Snack,
        &["kiosk", "snack", "slik", "chips", "candy", "confectionery"],
    ),
    (
        CategoryClass::Produce,
        &["grønt", "frugt", "grøntsager", "produce", "vegetables", "fruit"],
    ),
    (CategoryClass::Dairy, &["mejeri", "dairy", "køl"]),
    (CategoryClass::Meat, &["kød", "fjerkræ", "meat", "poultry", "pålæg"]),
    (CategoryClass::Fish, &["fisk", "fish", "seafood"]),
    (CategoryClass::Bakery, &["brød", "bageri", "bakery"]),
    (CategoryClass::Frozen, &["frost", "frozen"]),
    (
        CategoryClass::Beverages,
        &["vin", "drikke", "øl", "beverages", "drinks", "wine"],
    ),
    (
        CategoryClass::Pantry,
        &["kolonial", "pantry", "dry goods", "krydderier", "spices"],
    ),
];

/// Classify a vendor category string
pub fn classify_category(category: &str) -> CategoryClass {
    let category = category.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| category.contains(k)))
        .map(|(class, _)| *class)
        .unwrap_or(CategoryClass::Unknown)
}

/// Ingredient words per expected department, in both languages
const INGREDIENT_CLASS_KEYWORDS: &[(CategoryClass, &[&str])] = &[
    (
        CategoryClass::Dairy,
        &[
            "mælk", "fløde", "ost", "smør", "yoghurt", "skyr", "creme fraiche", "piskefløde",
            "flødeost", "hytteost", "parmesan", "mozzarella", "cheddar", "æg", "milk", "cream",
            "cheese", "butter", "yogurt", "egg", "eggs",
        ],
    ),
    (
        CategoryClass::Meat,
        &[
            "kød", "oksekød", "svinekød", "kylling", "kyllingebryst", "bacon", "skinke", "pølse",
            "pølser", "svinekotelet", "beef", "pork", "chicken", "ham", "sausage",
        ],
    ),
    (
        CategoryClass::Fish,
        &["fisk", "laks", "torsk", "rejer", "tun", "fish", "salmon", "shrimp", "cod", "tuna"],
    ),
    (
        CategoryClass::Produce,
        &[
            "løg", "rødløg", "hvidløg", "forårsløg", "skalotteløg", "tomat", "kartoffel",
            "kartofler", "gulerod", "gulerødder", "selleri", "salat", "agurk", "peberfrugt",
            "champignon", "spinat", "broccoli", "kål", "porre", "squash", "aubergine", "citron",
            "lime", "æble", "appelsin", "banan", "jordbær", "persille", "basilikum", "timian",
            "rosmarin", "koriander", "dild", "purløg", "ingefær", "avocado", "onion", "tomato",
            "potato", "carrot", "garlic", "lemon", "apple", "banana", "parsley", "basil",
        ],
    ),
    (
        CategoryClass::Bakery,
        &["brød", "rugbrød", "boller", "bread"],
    ),
    (
        CategoryClass::Beverages,
        &["vin", "hvidvin", "rødvin", "øl", "juice", "wine", "beer"],
    ),
    (
        CategoryClass::Pantry,
        &[
            "mel", "hvedemel", "sukker", "salt", "peber", "pasta", "spaghetti", "ris",
            "basmatiris", "olie", "olivenolie", "rapsolie", "eddike", "bouillon", "honning",
            "sennep", "bagepulver", "natron", "majsstivelse", "spidskommen", "kanel", "paprika",
            "oregano", "bønner", "kidneybønner", "nudler", "kokosmælk", "sojasauce", "rasp",
            "tortilla", "flour", "sugar", "rice", "oil", "vinegar",
        ],
    ),
];

/// Check whether an ingredient word matches a keyword, tolerating inflection
/// ("tomater" for "tomat") and Danish compounds ("letmælk" for "mælk")
pub fn word_matches(word: &str, keyword: &str) -> bool {
    if word == keyword {
        return true;
    }
    keyword.chars().count() >= 4 && (word.starts_with(keyword) || word.ends_with(keyword))
}

/// The department an ingredient is normally bought in.
///
/// The longest matching keyword wins, so "kokosmælk" is pantry, not dairy.
pub fn expected_category(ingredient_name: &str) -> Option<CategoryClass> {
    let words = tokenize(ingredient_name);
    let phrase = words.join(" ");
    let mut best: Option<(usize, CategoryClass)> = None;

    for (class, keywords) in INGREDIENT_CLASS_KEYWORDS {
        for keyword in *keywords {
            let hit = if keyword.contains(' ') {
                phrase.contains(keyword)
            } else {
                words.iter().any(|w| word_matches(w, keyword))
            };
            let length = keyword.chars().count();
            if hit && best.map_or(true, |(best_length, _)| length > best_length) {
                best = Some((length, *class));
            }
        }
    }

    best.map(|(_, class)| class)
}

/// A normalized catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCandidate {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub pack_size: Option<ParsedUnit>,
    pub in_stock: bool,
    pub labels: BTreeSet<ProductLabel>,
}

impl CatalogCandidate {
    /// Create an in-stock candidate without pack size or labels
    pub fn new(id: u64, name: &str, category: &str, price: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            category: category.to_string(),
            price,
            pack_size: None,
            in_stock: true,
            labels: BTreeSet::new(),
        }
    }

    /// Set the pack size from vendor text; unknown units leave it empty
    pub fn with_pack_size(mut self, text: &str) -> Self {
        self.pack_size = parse_pack_size(text);
        self
    }

    pub fn with_label(mut self, label: ProductLabel) -> Self {
        self.labels.insert(label);
        self
    }

    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }

    pub fn has_label(&self, label: ProductLabel) -> bool {
        self.labels.contains(&label)
    }

    pub fn category_class(&self) -> CategoryClass {
        classify_category(&self.category)
    }

    /// Price per kg, per liter or per piece, when the pack size is known
    pub fn unit_price(&self) -> Option<f64> {
        let pack = self.pack_size.as_ref()?;
        if pack.value <= 0.0 {
            return None;
        }
        let units = match pack.base {
            BaseUnit::Grams | BaseUnit::Milliliters => pack.value / 1000.0,
            BaseUnit::Pieces => pack.value,
        };
        Some(self.price / units)
    }
}

impl fmt::Display for CatalogCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} kr", self.name, self.price)?;
        if let Some(pack) = &self.pack_size {
            write!(f, ", {}", pack)?;
        }
        write!(f, ")")
    }
}

/// A product as a vendor feed or JSON fixture describes it
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    /// Free-text pack description ("500 g", "2 x 1 l")
    #[serde(default)]
    pub unit_size: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    /// Vendor label strings ("Økologisk", "Laktosefri")
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub on_discount: bool,
}

fn default_available() -> bool {
    true
}

impl From<CatalogRecord> for CatalogCandidate {
    fn from(record: CatalogRecord) -> Self {
        let mut labels: BTreeSet<ProductLabel> = record
            .labels
            .iter()
            .filter_map(|label| ProductLabel::from_vendor_label(label))
            .collect();
        if record.on_discount {
            labels.insert(ProductLabel::OnSale);
        }

        let pack_size = record.unit_size.as_deref().and_then(parse_pack_size);
        if pack_size.is_none() {
            trace!("Product {} has no readable pack size", record.id);
        }

        CatalogCandidate {
            id: record.id,
            name: record.name,
            category: record.category,
            price: record.price,
            pack_size,
            in_stock: record.available,
            labels,
        }
    }
}

/// Port to a catalog that can be searched by free text
pub trait CatalogSearch {
    fn search(&self, query: &str) -> Result<Vec<CatalogCandidate>, SearchError>;
}

/// A catalog held in memory, loadable from JSON
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    candidates: Vec<CatalogCandidate>,
}

impl InMemoryCatalog {
    pub fn new(candidates: Vec<CatalogCandidate>) -> Self {
        Self { candidates }
    }

    /// Parse a JSON array of catalog records
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<CatalogRecord> =
            serde_json::from_str(json).context("Failed to parse catalog JSON")?;
        let candidates: Vec<CatalogCandidate> = records.into_iter().map(Into::into).collect();
        debug!("Loaded {} catalog products", candidates.len());
        Ok(Self { candidates })
    }

    /// Load a JSON catalog file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        let catalog = Self::from_json_str(&json)
            .with_context(|| format!("Invalid catalog file {}", path.display()))?;
        info!("Catalog {} loaded with {} products", path.display(), catalog.len());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[CatalogCandidate] {
        &self.candidates
    }
}

impl CatalogSearch for InMemoryCatalog {
    /// Products whose name contains any query word of two or more letters,
    /// in catalog order. Noisy on purpose, like a vendor search box.
    fn search(&self, query: &str) -> Result<Vec<CatalogCandidate>, SearchError> {
        let words: Vec<String> = tokenize(query)
            .into_iter()
            .filter(|w| w.chars().count() >= 2)
            .collect();
        if words.is_empty() {
            return Err(SearchError::InvalidQuery(query.to_string()));
        }

        let results: Vec<CatalogCandidate> = self
            .candidates
            .iter()
            .filter(|candidate| {
                let name = candidate.name.to_lowercase();
                words.iter().any(|w| name.contains(w.as_str()))
            })
            .cloned()
            .collect();

        trace!("Search '{}' returned {} products", query, results.len());
        Ok(results)
    }
}
