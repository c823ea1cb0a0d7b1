// ============================================================
// Layer 3 — Category Set
// ============================================================
// The fixed pool of positive-class strings. Loaded once at
// process start and shared read-only (cheap Arc clones), so
// concurrent request handlers need no locking.

use std::{collections::HashSet, fs, path::Path, sync::Arc};

use crate::domain::error::{PipelineError, PipelineResult};

/// Built-in positive class: dog breed names.
pub const BREEDS: &[&str] = &[
    "Affenpinscher", "Afghan Hound", "Airedale Terrier", "Akita", "Alaskan Malamute",
    "American Bulldog", "American Eskimo Dog", "American Foxhound", "Anatolian Shepherd",
    "Australian Cattle Dog", "Australian Shepherd", "Australian Terrier", "Basenji",
    "Basset Hound", "Beagle", "Bearded Collie", "Bedlington Terrier", "Bernese Mountain Dog",
    "Bichon Frise", "Black Russian Terrier", "Bloodhound", "Border Collie", "Border Terrier",
    "Borzoi", "Boston Terrier", "Boxer", "Briard", "Brittany", "Brussels Griffon",
    "Bull Terrier", "Bulldog", "Bullmastiff", "Cairn Terrier", "Cane Corso",
    "Cavalier King Charles Spaniel", "Chesapeake Bay Retriever", "Chihuahua",
    "Chinese Crested", "Chow Chow", "Cocker Spaniel", "Collie", "Corgi", "Dachshund",
    "Dalmatian", "Doberman Pinscher", "Dogue de Bordeaux", "English Setter",
    "English Springer Spaniel", "Field Spaniel", "Finnish Spitz", "Flat-Coated Retriever",
    "French Bulldog", "German Pinscher", "German Shepherd", "German Shorthaired Pointer",
    "Giant Schnauzer", "Golden Retriever", "Gordon Setter", "Great Dane", "Great Pyrenees",
    "Greyhound", "Havanese", "Husky", "Ibizan Hound", "Irish Setter", "Irish Wolfhound",
    "Italian Greyhound", "Jack Russell Terrier", "Japanese Chin", "Keeshond",
    "Kerry Blue Terrier", "Komondor", "Kuvasz", "Labrador Retriever", "Lagotto Romagnolo",
    "Leonberger", "Lhasa Apso", "Maltese", "Mastiff", "Miniature Pinscher",
    "Miniature Schnauzer", "Newfoundland", "Norfolk Terrier", "Norwegian Elkhound",
    "Old English Sheepdog", "Papillon", "Pekingese", "Pharaoh Hound", "Pointer",
    "Pomeranian", "Poodle", "Portuguese Water Dog", "Pug", "Puli", "Rhodesian Ridgeback",
    "Rottweiler", "Saint Bernard", "Saluki", "Samoyed", "Schipperke", "Scottish Terrier",
    "Shar Pei", "Shetland Sheepdog", "Shiba Inu", "Shih Tzu", "Siberian Husky",
    "Staffordshire Bull Terrier", "Standard Schnauzer", "Tibetan Mastiff", "Tibetan Terrier",
    "Vizsla", "Weimaraner", "Welsh Terrier", "West Highland White Terrier", "Whippet",
    "Wire Fox Terrier", "Xoloitzcuintli", "Yorkshire Terrier",
];

#[derive(Debug, Clone)]
pub struct CategorySet {
    members: Arc<[String]>,
}

impl CategorySet {
    /// Build a set from any list of names. Duplicates are dropped
    /// (first occurrence wins) and blank names are ignored.
    pub fn new<I, S>(names: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let members: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|n| !n.trim().is_empty())
            .filter(|n| seen.insert(n.clone()))
            .collect();

        if members.is_empty() {
            return Err(PipelineError::Configuration(
                "category set must contain at least one name".to_string(),
            ));
        }
        Ok(Self { members: members.into() })
    }

    /// The built-in dog breed list.
    pub fn breeds() -> Self {
        Self {
            members: BREEDS.iter().map(|b| b.to_string()).collect(),
        }
    }

    /// Read one name per line; blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let text = fs::read_to_string(path)?;
        let names = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.starts_with('#'))
            .map(str::to_string);
        let set = Self::new(names)?;
        tracing::info!("Loaded {} categories from '{}'", set.len(), path.display());
        Ok(set)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.members
    }
}
