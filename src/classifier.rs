/*!
 * Utterance sharing classification.
 *
 * Train contributors' utterances go to `train`. Each dev or test utterance is
 * `shared` when its prompt text was also uttered in train and it is not a
 * spontaneous-speech prompt, otherwise `unshared`. The set of train texts is
 * complete before any held-out utterance is classified.
 */

use log::info;
use std::collections::HashSet;

use crate::corpus::{Corpus, Utterance};
use crate::resolver::Assignment;
use crate::split::SplitResult;
use crate::subset::{Bucket, HeldOut, Sharing, Subset};

/// Builds split manifests from an assignment
#[derive(Debug, Clone)]
pub struct Classifier {
    spontaneous_category: String,
}

impl Classifier {
    pub fn new(spontaneous_category: &str) -> Self {
        Self {
            spontaneous_category: spontaneous_category.to_string(),
        }
    }

    /// Partition every utterance of every assigned contributor into one bucket
    pub fn classify(&self, assignment: &Assignment, corpus: &Corpus) -> SplitResult {
        let mut result = SplitResult::new();

        for utterance in Self::utterances_in(assignment, corpus, Subset::Train) {
            result.insert(Bucket::Train, &utterance.filename, utterance.into());
        }

        let train_texts = Self::train_prompt_texts(assignment, corpus);

        for held_out in HeldOut::ALL {
            for utterance in Self::utterances_in(assignment, corpus, held_out.subset()) {
                let sharing = self.sharing_of(utterance, &train_texts);
                result.insert(Bucket::HeldOut(held_out, sharing), &utterance.filename, utterance.into());
            }
        }

        for (bucket, count) in result.counts() {
            info!("{} {}", bucket, count);
        }
        result
    }

    /// Every prompt text uttered by a train contributor, whatever its category
    pub fn train_prompt_texts<'a>(assignment: &Assignment, corpus: &'a Corpus) -> HashSet<&'a str> {
        Self::utterances_in(assignment, corpus, Subset::Train)
            .map(|u| u.text.as_str())
            .collect()
    }

    /// Shared iff the text occurs in train and the prompt is not spontaneous
    pub fn sharing_of(&self, utterance: &Utterance, train_texts: &HashSet<&str>) -> Sharing {
        if utterance.category != self.spontaneous_category
            && train_texts.contains(utterance.text.as_str())
        {
            Sharing::Shared
        } else {
            Sharing::Unshared
        }
    }

    // Utterances of the contributors assigned to `subset`, in corpus order
    fn utterances_in<'a, 'b>(
        assignment: &'b Assignment,
        corpus: &'a Corpus,
        subset: Subset,
    ) -> impl Iterator<Item = &'a Utterance> {
        corpus
            .contributors()
            .iter()
            .filter(move |c| assignment.subset_of(&c.id) == Some(subset))
            .flat_map(|c| c.utterances.iter())
    }
}
