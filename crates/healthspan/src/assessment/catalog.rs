use std::collections::BTreeSet;

use super::domain::{Polarity, Question, RawAnswers, SystemTag};

use Polarity::{Negative, Positive};

/// Immutable question set, verified against the system configuration on construction.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

/// Fatal configuration problems detected before any scoring happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("system '{}' has no questions", .0.label())]
    EmptySystem(SystemTag),
    #[error("system '{}' expects {expected} questions but the catalog has {actual}", .system.label())]
    CardinalityMismatch {
        system: SystemTag,
        expected: usize,
        actual: usize,
    },
    #[error("question id '{0}' appears more than once")]
    DuplicateQuestionId(String),
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        verify(&questions)?;
        Ok(Self { questions })
    }

    /// The 32-question healthspan questionnaire.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(standard_questions())
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn questions_for(&self, system: SystemTag) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|question| question.system == system)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    /// Catalog ids with no entry in `answers`, in catalog order.
    pub fn unanswered(&self, answers: &RawAnswers) -> Vec<&'static str> {
        self.questions
            .iter()
            .filter(|question| !answers.contains_key(question.id))
            .map(|question| question.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn verify(questions: &[Question]) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for question in questions {
        if !seen.insert(question.id) {
            return Err(CatalogError::DuplicateQuestionId(question.id.to_string()));
        }
    }

    for system in SystemTag::ordered() {
        let actual = questions
            .iter()
            .filter(|question| question.system == system)
            .count();
        if actual == 0 {
            return Err(CatalogError::EmptySystem(system));
        }

        let expected = system.config().expected_question_count;
        if actual != expected {
            return Err(CatalogError::CardinalityMismatch {
                system,
                expected,
                actual,
            });
        }
    }

    Ok(())
}

const fn question(
    id: &'static str,
    system: SystemTag,
    polarity: Polarity,
    text: &'static str,
) -> Question {
    Question {
        id,
        system,
        polarity,
        text,
    }
}

fn standard_questions() -> Vec<Question> {
    use SystemTag::*;

    vec![
        question("a1", Assimilation, Negative, "Do you feel gassy or bloated after meals?"),
        question("a2", Assimilation, Positive, "Do you have regular bowel movements (at least once a day)?"),
        question("a3", Assimilation, Negative, "Do you experience heartburn or acid reflux?"),
        question("a4", Assimilation, Positive, "After eating, do you feel comfortably full rather than overfull?"),
        question("a5", Assimilation, Negative, "Do you have allergies or sensitivities to particular foods?"),
        question("d1", Defense, Negative, "Do you catch colds or the flu often?"),
        question("d2", Defense, Positive, "Do cuts and scrapes heal quickly?"),
        question("d3", Defense, Negative, "Do you have chronic inflammation or joint pain?"),
        question("d4", Defense, Negative, "Do you have an autoimmune condition or a family history of one?"),
        question("d5", Defense, Positive, "Is your skin generally clear and healthy?"),
        question("e1", Energy, Positive, "Do you wake up feeling refreshed?"),
        question("e2", Energy, Negative, "Do you hit a sharp energy slump in the afternoon?"),
        question("e3", Energy, Positive, "Can you exercise without tiring quickly?"),
        question("e4", Energy, Negative, "Do you rely on caffeine or sugar to get through the day?"),
        question("e5", Energy, Positive, "Would you describe your overall vitality as high?"),
        question("dx1", Detox, Negative, "Are you sensitive to strong odors, perfume or chemical smells?"),
        question("dx2", Detox, Positive, "Do you sweat easily when you exercise?"),
        question("dx3", Detox, Negative, "Do you often drink alcohol or eat processed food?"),
        question("dx4", Detox, Negative, "Do you wake up with a coated tongue or bad breath?"),
        question("t1", Transport, Negative, "Are your hands and feet often cold?"),
        question("t2", Transport, Negative, "Do you feel dizzy when standing up (orthostatic hypotension)?"),
        question("t3", Transport, Positive, "Does your blood pressure stay within the normal range?"),
        question("t4", Transport, Negative, "Do you bruise easily or have varicose veins?"),
        question("c1", Communication, Negative, "Do you have trouble falling or staying asleep?"),
        question("c2", Communication, Negative, "Do you have mood swings or get irritated easily?"),
        question("c3", Communication, Positive, "Do you cope with and manage stress well?"),
        question("c4", Communication, Positive, "Is your memory and concentration clear and sharp?"),
        question("c5", Communication, Negative, "Do you have thyroid or blood sugar regulation problems?"),
        question("s1", Structural, Positive, "Do you keep good posture without thinking about it?"),
        question("s2", Structural, Negative, "Do you have chronic lower back or neck pain?"),
        question("s3", Structural, Positive, "Are your muscles flexible and supple?"),
        question("s4", Structural, Negative, "Have you had fractures or do your bones feel weak?"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_passes_consistency_check() {
        let catalog = QuestionCatalog::standard().expect("standard catalog is consistent");
        assert_eq!(catalog.len(), 32);
        for system in SystemTag::ordered() {
            assert_eq!(
                catalog.questions_for(system).len(),
                system.config().expected_question_count
            );
        }
    }

    #[test]
    fn standard_catalog_marks_nineteen_negative_questions() {
        let catalog = QuestionCatalog::standard().expect("standard catalog is consistent");
        let negatives: Vec<&str> = catalog
            .questions()
            .iter()
            .filter(|question| question.polarity == Negative)
            .map(|question| question.id)
            .collect();
        assert_eq!(negatives.len(), 19);
        assert!(negatives.contains(&"e2"));
        assert!(negatives.contains(&"e4"));
        assert!(!negatives.contains(&"e1"));
    }

    #[test]
    fn rejects_system_without_questions() {
        let questions: Vec<Question> = standard_questions()
            .into_iter()
            .filter(|question| question.system != SystemTag::Detox)
            .collect();
        let err = QuestionCatalog::new(questions).expect_err("detox is empty");
        assert_eq!(err, CatalogError::EmptySystem(SystemTag::Detox));
    }

    #[test]
    fn rejects_cardinality_mismatch() {
        let mut questions = standard_questions();
        questions.retain(|question| question.id != "t4");
        let err = QuestionCatalog::new(questions).expect_err("transport is short");
        assert_eq!(
            err,
            CatalogError::CardinalityMismatch {
                system: SystemTag::Transport,
                expected: 4,
                actual: 3,
            }
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut questions = standard_questions();
        questions[1].id = "a1";
        let err = QuestionCatalog::new(questions).expect_err("duplicate id");
        assert_eq!(err, CatalogError::DuplicateQuestionId("a1".to_string()));
    }

    #[test]
    fn reports_unanswered_in_catalog_order() {
        let catalog = QuestionCatalog::standard().expect("standard catalog is consistent");
        let mut answers = RawAnswers::new();
        for question in catalog.questions() {
            answers.insert(question.id.to_string(), 4);
        }
        answers.remove("s4");
        answers.remove("a2");
        assert_eq!(catalog.unanswered(&answers), vec!["a2", "s4"]);
    }
}
