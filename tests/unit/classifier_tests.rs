/*!
 * Tests for shared/unshared utterance classification
 */

use sapsplit::classifier::Classifier;
use sapsplit::corpus::{Corpus, Utterance};
use sapsplit::resolver::{Assignment, AssignmentBuilder};
use sapsplit::subset::{Bucket, HeldOut, Sharing, Subset};
use crate::common::{self, COMMANDS, SPONTANEOUS};

fn assign(pairs: &[(&str, Subset)]) -> Assignment {
    let mut builder = AssignmentBuilder::new();
    for (id, subset) in pairs {
        builder.assign(&(*id).into(), *subset);
    }
    builder.build()
}

/// Test the basic train/dev scenario with one shared text
#[test]
fn test_classify_withTrainAndDevContributors_shouldMarkSharedText() {
    let corpus = Corpus::from_contributors(vec![
        common::contributor("C", &[(COMMANDS, "Turn on the lights"), (COMMANDS, "What time is it")]),
        common::contributor("D", &[(COMMANDS, "Turn on the lights"), (COMMANDS, "Call my sister")]),
    ]);
    let assignment = assign(&[("C", Subset::Train), ("D", Subset::Dev)]);

    let split = Classifier::new(SPONTANEOUS).classify(&assignment, &corpus);

    assert_eq!(split.train.len(), 2);
    assert_eq!(split.dev.shared.keys().collect::<Vec<_>>(), vec!["d_0.wav"]);
    assert_eq!(split.dev.unshared.keys().collect::<Vec<_>>(), vec!["d_1.wav"]);
    assert_eq!(split.dev.shared["d_0.wav"].text(), "Turn on the lights");
}

/// Test that a spontaneous prompt stays unshared even when train uttered the same text
#[test]
fn test_classify_withSpontaneousTextInTrain_shouldStayUnshared() {
    let corpus = Corpus::from_contributors(vec![
        common::contributor("C", &[(SPONTANEOUS, "Tell me about your day")]),
        common::contributor("T", &[(SPONTANEOUS, "Tell me about your day")]),
    ]);
    let assignment = assign(&[("C", Subset::Train), ("T", Subset::Test)]);

    let split = Classifier::new(SPONTANEOUS).classify(&assignment, &corpus);

    assert!(split.test.shared.is_empty());
    assert!(split.test.unshared.contains_key("t_0.wav"));
}

/// Test that a text shared only between dev and test stays unshared
#[test]
fn test_classify_withTextOnlyInDevAndTest_shouldBeUnshared() {
    let corpus = Corpus::from_contributors(vec![
        common::contributor("D", &[(COMMANDS, "Read my messages")]),
        common::contributor("T", &[(COMMANDS, "Read my messages")]),
    ]);
    let assignment = assign(&[("D", Subset::Dev), ("T", Subset::Test)]);

    let split = Classifier::new(SPONTANEOUS).classify(&assignment, &corpus);

    assert_eq!(split.bucket_of("d_0.wav"), Some(Bucket::HeldOut(HeldOut::Dev, Sharing::Unshared)));
    assert_eq!(split.bucket_of("t_0.wav"), Some(Bucket::HeldOut(HeldOut::Test, Sharing::Unshared)));
}

/// Test that held-out contributors listed before train ones still see the full train set
#[test]
fn test_classify_withHeldOutBeforeTrainInCorpus_shouldStillShare() {
    let corpus = Corpus::from_contributors(vec![
        common::contributor("A", &[(COMMANDS, "Turn on the lights")]),
        common::contributor("Z", &[(COMMANDS, "Turn on the lights")]),
    ]);
    let assignment = assign(&[("A", Subset::Test), ("Z", Subset::Train)]);

    let split = Classifier::new(SPONTANEOUS).classify(&assignment, &corpus);

    assert!(split.test.shared.contains_key("a_0.wav"));
}

/// Test that every utterance of an assigned contributor lands in exactly one bucket
#[test]
fn test_classify_withMixedCorpus_shouldPartitionAllUtterances() {
    let corpus = Corpus::from_contributors(vec![
        common::contributor("A", &[(COMMANDS, "One"), (COMMANDS, "Two"), (SPONTANEOUS, "Free")]),
        common::contributor("B", &[(COMMANDS, "One"), (COMMANDS, "Three")]),
        common::contributor("C", &[(COMMANDS, "Two"), (SPONTANEOUS, "Free")]),
        common::contributor("X", &[(COMMANDS, "One")]),
    ]);
    let assignment = assign(&[("A", Subset::Train), ("B", Subset::Dev), ("C", Subset::Test)]);

    let split = Classifier::new(SPONTANEOUS).classify(&assignment, &corpus);

    assert_eq!(split.len(), 7);
    assert_eq!(split.bucket_of("x_0.wav"), None);
    for contributor in corpus.contributors().iter().take(3) {
        for utterance in &contributor.utterances {
            let buckets = Bucket::all()
                .into_iter()
                .filter(|b| split.bucket(*b).contains_key(&utterance.filename))
                .count();
            assert_eq!(buckets, 1, "{} should be in exactly one bucket", utterance.filename);
        }
    }
    assert!(split.test.unshared.contains_key("c_1.wav"));
    assert!(split.test.shared.contains_key("c_0.wav"));
}

/// Test that the train text set ignores category
#[test]
fn test_trainPromptTexts_shouldIncludeEveryTrainText() {
    let corpus = Corpus::from_contributors(vec![
        common::contributor("A", &[(COMMANDS, "One"), (SPONTANEOUS, "Free")]),
        common::contributor("B", &[(COMMANDS, "Two")]),
    ]);
    let assignment = assign(&[("A", Subset::Train), ("B", Subset::Dev)]);

    let texts = Classifier::train_prompt_texts(&assignment, &corpus);

    assert_eq!(texts.len(), 2);
    assert!(texts.contains("Free"));
    assert!(!texts.contains("Two"));
}

/// Test that transcripts are carried into the manifest entry
#[test]
fn test_classify_withTranscript_shouldKeepTranscript() {
    let utterance = Utterance::new("a.wav", COMMANDS, "Turn on the lights").with_transcript("turn on the lights");
    let corpus = Corpus::from_contributors(vec![sapsplit::corpus::Contributor::new("A", vec![utterance])]);
    let assignment = assign(&[("A", Subset::Train)]);

    let split = Classifier::new(SPONTANEOUS).classify(&assignment, &corpus);

    assert_eq!(split.train["a.wav"].transcript(), Some("turn on the lights"));
}
