use std::fmt;
use std::str::FromStr;

/// What the poster is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Asking for information or advice
    Question,
    /// Unhappy with a product or vendor
    Complaint,
    /// Actively looking for a tool or provider
    VendorSearch,
    /// Anything else
    GeneralChatter,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Question => "question",
            Intent::Complaint => "complaint",
            Intent::VendorSearch => "vendor search",
            Intent::GeneralChatter => "general chatter",
        }
    }

    pub fn all() -> &'static [Intent] {
        &[
            Intent::Question,
            Intent::Complaint,
            Intent::VendorSearch,
            Intent::GeneralChatter,
        ]
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Intent {
    type Err = String;

    /// Accepts `vendor search`, `vendor-search`, `Vendor_Search` and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Intent::all()
            .iter()
            .copied()
            .find(|intent| normalize(intent.label()) == normalized)
            .ok_or_else(|| format!("unknown intent {:?}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// `Positive`, `Negative`, `Neutral`
    pub fn capitalized(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(format!("unknown sentiment {:?}", s)),
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
