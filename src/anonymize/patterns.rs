//! Ordered redaction passes.
//!
//! Each pass runs on the output of the previous one. High-precision patterns
//! (emails, structured numbers) come before the broad heuristics (names,
//! vocabulary), and no pattern can match a placeholder emitted earlier.
//! IBANs are redacted before phone numbers: the grouped digits of an IBAN
//! contain runs that look like a French national number.

use std::sync::LazyLock;

use regex::Regex;

/// Category of sensitive data, each with a fixed placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Email,
    Phone,
    Iban,
    AccountNumber,
    Address,
    Name,
    Medical,
}

impl Category {
    /// Every category, in pass order.
    pub const ALL: [Category; 7] = [
        Category::Email,
        Category::Iban,
        Category::Phone,
        Category::AccountNumber,
        Category::Address,
        Category::Name,
        Category::Medical,
    ];

    /// Token that replaces a matched span.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Category::Email => "[EMAIL]",
            Category::Phone => "[PHONE]",
            Category::Iban => "[IBAN]",
            Category::AccountNumber => "[ACCOUNT_NUMBER]",
            Category::Address => "[ADDRESS]",
            Category::Name => "[NAME]",
            Category::Medical => "[MEDICAL]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Email => "email",
            Category::Phone => "phone",
            Category::Iban => "iban",
            Category::AccountNumber => "account_number",
            Category::Address => "address",
            Category::Name => "name",
            Category::Medical => "medical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "email" => Some(Category::Email),
            "phone" => Some(Category::Phone),
            "iban" => Some(Category::Iban),
            "account_number" | "account" => Some(Category::AccountNumber),
            "address" => Some(Category::Address),
            "name" => Some(Category::Name),
            "medical" => Some(Category::Medical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single redaction step.
pub struct RedactionPass {
    pub category: Category,
    pub pattern: Regex,
}

/// Redaction passes in application order.
static PASSES: LazyLock<Vec<RedactionPass>> = LazyLock::new(|| {
    [
        (
            Category::Email,
            r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}",
        ),
        // FR76 3000 6000 0112 3456 7890 189, any case. Runs before the phone
        // pass, whose national form would otherwise eat the trailing digit groups.
        (
            Category::Iban,
            r"(?i)\b[A-Z]{2}\d{2}(?:[ ]?[A-Z0-9]{4}){2,7}(?:[ ]?[A-Z0-9]{1,3})?\b",
        ),
        // International (+33 6 12 34 56 78) or French national (06.12.34.56.78)
        (
            Category::Phone,
            r"(?:\+\d{1,3}[ .\-]?(?:\(0\)[ .\-]?)?\d{1,4}(?:[ .\-]?\d{2,4}){2,4}|\b0[1-9](?:[ .\-]?\d{2}){4})\b",
        ),
        (Category::AccountNumber, r"\b\d{11,26}\b"),
        // Rest of the line from the (optional) street number onward
        (
            Category::Address,
            r"(?i)(?:\b\d{1,4}(?:[ ]?(?:bis|ter))?,?[ \t]+)?\b(?:rue|avenue|boulevard|chemin|impasse|all[ée]e)\b[^\n]*",
        ),
        // Civility title + surname (+ given name), or two capitalized words on one line
        (
            Category::Name,
            r"\b(?:(?:Mademoiselle|Monsieur|Madame|Mlle\.?|Mme\.?|Mr\.?|M\.)[ \t]+\p{Lu}[\p{L}'\-]*(?:[ \t]+\p{Lu}[\p{L}'\-]*)?|\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?[ \t]+\p{Lu}(?:\p{Ll}+|\p{Lu}+)(?:-\p{Lu}\p{Ll}+)?\b)",
        ),
        (
            Category::Medical,
            r"(?i)\b(?:maladies?|diagnostics?|traitements?|ordonnances?|sympt[ôo]mes?|allergies?|hospitalisations?|pathologies?|m[ée]dicaments?|chimioth[ée]rapies?|th[ée]rapies?|diab[èe]tes?|cancers?|handicaps?)\b",
        ),
    ]
    .into_iter()
    .map(|(category, pattern)| RedactionPass {
        category,
        pattern: Regex::new(pattern).unwrap(),
    })
    .collect()
});

/// All passes in the order they are applied.
pub fn passes() -> &'static [RedactionPass] {
    &PASSES
}

/// Look up the pass for a category.
pub fn pass_for(category: Category) -> &'static RedactionPass {
    PASSES
        .iter()
        .find(|p| p.category == category)
        .unwrap_or_else(|| unreachable!("every category has a pass"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_order_matches_categories() {
        let order: Vec<Category> = passes().iter().map(|p| p.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }

    #[test]
    fn test_placeholders_never_match() {
        for pass in passes() {
            for category in Category::ALL {
                assert!(
                    !pass.pattern.is_match(category.placeholder()),
                    "{} pass matched {}",
                    pass.category,
                    category.placeholder()
                );
            }
        }
    }

    #[test]
    fn test_category_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Some(category));
        }
        assert_eq!(
            Category::from_str("Account-Number"),
            Some(Category::AccountNumber)
        );
        assert_eq!(Category::from_str("ssn"), None);
    }
}
