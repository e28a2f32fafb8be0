use serde::{Deserialize, Serialize};

// @module: Subsets and bucket labels

/// One of the three corpus partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subset {
    Train,
    Dev,
    Test,
}

impl Subset {
    /// Enumeration order. Majority-vote ties resolve to the earliest entry.
    pub const ALL: [Subset; 3] = [Subset::Train, Subset::Dev, Subset::Test];

    // @returns: Lowercase subset name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Dev => "dev",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for Subset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subset that is split into shared and unshared buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeldOut {
    Dev,
    Test,
}

impl HeldOut {
    pub const ALL: [HeldOut; 2] = [HeldOut::Dev, HeldOut::Test];

    pub fn subset(&self) -> Subset {
        match self {
            Self::Dev => Subset::Dev,
            Self::Test => Subset::Test,
        }
    }
}

impl std::fmt::Display for HeldOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.subset())
    }
}

/// Whether a held-out utterance's prompt text also occurs in train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sharing {
    Shared,
    Unshared,
}

impl Sharing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Unshared => "unshared",
        }
    }
}

/// Leaf bucket of a split manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    Train,
    HeldOut(HeldOut, Sharing),
}

impl Bucket {
    /// All five buckets in manifest order
    pub fn all() -> Vec<Bucket> {
        let mut buckets = vec![Bucket::Train];
        for held_out in HeldOut::ALL {
            buckets.push(Bucket::HeldOut(held_out, Sharing::Shared));
            buckets.push(Bucket::HeldOut(held_out, Sharing::Unshared));
        }
        buckets
    }

    /// Label used by diff reports: `train` or `<subset>:<shared|unshared>`
    pub fn label(&self) -> String {
        match self {
            Self::Train => "train".to_string(),
            Self::HeldOut(held_out, sharing) => format!("{}:{}", held_out, sharing.as_str()),
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
