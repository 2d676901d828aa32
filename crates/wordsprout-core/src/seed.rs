//! # Seed Catalogue
//!
//! The built-in categories, leveled vocabulary and exercise templates.
//!
//! Loading is idempotent: categories upsert on name, words on
//! `(text, level)` and exercises on `(title, level)`, so re-running
//! [`seed`] refreshes the catalogue without duplicating rows.

use crate::error::{CoreError, Result};
use crate::exercise::{Bucket, ExerciseContent, ImageChoice, MatchPair, SortItem, SoundWord};
use crate::level::Level;
use crate::store::{NewCategory, NewExercise, NewWord, Store};
use crate::CategoryId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `(name, description, icon)`
pub const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Family", "Family members and relationships", "👪"),
    ("Body Parts", "Parts of the body", "👤"),
    ("Food", "Food and drinks", "🍎"),
    ("Animals", "Animals and pets", "🐶"),
    ("Toys", "Toys and playthings", "🧸"),
    ("Actions", "Action words and verbs", "🏃"),
    ("Colors", "Colors and visual descriptions", "🌈"),
    ("Numbers", "Numbers and counting", "🔢"),
    ("Clothing", "Clothes and accessories", "👕"),
    ("Transportation", "Vehicles and transportation", "🚗"),
    ("Home", "House and household items", "🏠"),
    ("Nature", "Nature and weather", "🌳"),
    ("Emotions", "Feelings and emotions", "😊"),
    ("Social", "Social words and greetings", "👋"),
];

/// `(text, level, category, difficulty)`
pub const WORDS: &[(&str, u8, &str, u8)] = &[
    // Level 0
    ("mama", 0, "Family", 1),
    ("dada", 0, "Family", 1),
    ("baby", 0, "Family", 2),
    ("eye", 0, "Body Parts", 2),
    ("nose", 0, "Body Parts", 2),
    ("mouth", 0, "Body Parts", 3),
    ("milk", 0, "Food", 1),
    ("water", 0, "Food", 2),
    ("more", 0, "Food", 1),
    ("eat", 0, "Food", 2),
    ("dog", 0, "Animals", 1),
    ("cat", 0, "Animals", 1),
    ("moo", 0, "Animals", 1),
    ("go", 0, "Actions", 1),
    ("up", 0, "Actions", 1),
    ("bye", 0, "Social", 1),
    ("hi", 0, "Social", 1),
    ("no", 0, "Social", 1),
    ("yes", 0, "Social", 2),
    ("mine", 0, "Social", 2),
    ("ball", 0, "Toys", 1),
    ("book", 0, "Toys", 2),
    ("car", 0, "Transportation", 1),

    // Level 1
    ("mommy", 1, "Family", 1),
    ("daddy", 1, "Family", 1),
    ("grandma", 1, "Family", 3),
    ("grandpa", 1, "Family", 3),
    ("hand", 1, "Body Parts", 1),
    ("foot", 1, "Body Parts", 1),
    ("head", 1, "Body Parts", 1),
    ("hair", 1, "Body Parts", 2),
    ("ear", 1, "Body Parts", 2),
    ("apple", 1, "Food", 2),
    ("banana", 1, "Food", 3),
    ("cookie", 1, "Food", 2),
    ("juice", 1, "Food", 2),
    ("bread", 1, "Food", 2),
    ("bird", 1, "Animals", 2),
    ("fish", 1, "Animals", 2),
    ("horse", 1, "Animals", 2),
    ("pig", 1, "Animals", 2),
    ("walk", 1, "Actions", 2),
    ("run", 1, "Actions", 2),
    ("sit", 1, "Actions", 2),
    ("come", 1, "Actions", 2),
    ("help", 1, "Actions", 2),
    ("red", 1, "Colors", 2),
    ("blue", 1, "Colors", 2),
    ("one", 1, "Numbers", 2),
    ("two", 1, "Numbers", 3),
    ("shoe", 1, "Clothing", 2),
    ("hat", 1, "Clothing", 2),
    ("bed", 1, "Home", 2),
    ("chair", 1, "Home", 2),
    ("door", 1, "Home", 2),
    ("bus", 1, "Transportation", 2),
    ("truck", 1, "Transportation", 2),
    ("please", 1, "Social", 3),
    ("thank you", 1, "Social", 4),

    // Level 2
    ("brother", 2, "Family", 3),
    ("sister", 2, "Family", 3),
    ("uncle", 2, "Family", 3),
    ("aunt", 2, "Family", 3),
    ("finger", 2, "Body Parts", 3),
    ("toe", 2, "Body Parts", 3),
    ("knee", 2, "Body Parts", 3),
    ("elbow", 2, "Body Parts", 4),
    ("shoulder", 2, "Body Parts", 4),
    ("cheese", 2, "Food", 3),
    ("chicken", 2, "Food", 3),
    ("soup", 2, "Food", 3),
    ("cereal", 2, "Food", 3),
    ("sandwich", 2, "Food", 4),
    ("elephant", 2, "Animals", 4),
    ("lion", 2, "Animals", 3),
    ("bear", 2, "Animals", 3),
    ("rabbit", 2, "Animals", 3),
    ("monkey", 2, "Animals", 3),
    ("jump", 2, "Actions", 3),
    ("dance", 2, "Actions", 3),
    ("sing", 2, "Actions", 3),
    ("play", 2, "Actions", 3),
    ("sleep", 2, "Actions", 3),
    ("yellow", 2, "Colors", 3),
    ("green", 2, "Colors", 3),
    ("orange", 2, "Colors", 4),
    ("purple", 2, "Colors", 4),
    ("three", 2, "Numbers", 3),
    ("four", 2, "Numbers", 3),
    ("five", 2, "Numbers", 4),
    ("shirt", 2, "Clothing", 3),
    ("pants", 2, "Clothing", 3),
    ("socks", 2, "Clothing", 3),
    ("jacket", 2, "Clothing", 4),
    ("table", 2, "Home", 3),
    ("window", 2, "Home", 3),
    ("kitchen", 2, "Home", 4),
    ("bathroom", 2, "Home", 4),
    ("airplane", 2, "Transportation", 4),
    ("train", 2, "Transportation", 3),
    ("boat", 2, "Transportation", 3),
    ("tree", 2, "Nature", 3),
    ("flower", 2, "Nature", 3),
    ("sun", 2, "Nature", 3),
    ("moon", 2, "Nature", 3),
    ("happy", 2, "Emotions", 3),
    ("sad", 2, "Emotions", 3),
    ("mad", 2, "Emotions", 3),
    ("sorry", 2, "Social", 3),
    ("excuse me", 2, "Social", 4),
    ("friend", 2, "Social", 3),

    // Level 3
    ("cousin", 3, "Family", 4),
    ("nephew", 3, "Family", 5),
    ("niece", 3, "Family", 5),
    ("family", 3, "Family", 4),
    ("stomach", 3, "Body Parts", 4),
    ("back", 3, "Body Parts", 4),
    ("chest", 3, "Body Parts", 4),
    ("neck", 3, "Body Parts", 4),
    ("wrist", 3, "Body Parts", 5),
    ("ankle", 3, "Body Parts", 5),
    ("vegetables", 3, "Food", 5),
    ("spaghetti", 3, "Food", 5),
    ("hamburger", 3, "Food", 4),
    ("pizza", 3, "Food", 4),
    ("breakfast", 3, "Food", 4),
    ("lunch", 3, "Food", 4),
    ("dinner", 3, "Food", 4),
    ("giraffe", 3, "Animals", 4),
    ("zebra", 3, "Animals", 4),
    ("tiger", 3, "Animals", 4),
    ("penguin", 3, "Animals", 4),
    ("butterfly", 3, "Animals", 5),
    ("dinosaur", 3, "Animals", 4),
    ("swimming", 3, "Actions", 4),
    ("climbing", 3, "Actions", 4),
    ("drawing", 3, "Actions", 4),
    ("reading", 3, "Actions", 4),
    ("writing", 3, "Actions", 5),
    ("cooking", 3, "Actions", 4),
    ("cleaning", 3, "Actions", 4),
    ("pink", 3, "Colors", 4),
    ("brown", 3, "Colors", 4),
    ("black", 3, "Colors", 4),
    ("white", 3, "Colors", 4),
    ("gray", 3, "Colors", 5),
    ("six", 3, "Numbers", 4),
    ("seven", 3, "Numbers", 4),
    ("eight", 3, "Numbers", 4),
    ("nine", 3, "Numbers", 4),
    ("ten", 3, "Numbers", 4),
    ("dress", 3, "Clothing", 4),
    ("sweater", 3, "Clothing", 4),
    ("pajamas", 3, "Clothing", 5),
    ("underwear", 3, "Clothing", 4),
    ("gloves", 3, "Clothing", 4),
    ("bedroom", 3, "Home", 4),
    ("living room", 3, "Home", 5),
    ("garage", 3, "Home", 4),
    ("basement", 3, "Home", 5),
    ("attic", 3, "Home", 5),
    ("stairs", 3, "Home", 4),
    ("helicopter", 3, "Transportation", 5),
    ("motorcycle", 3, "Transportation", 5),
    ("bicycle", 3, "Transportation", 4),
    ("scooter", 3, "Transportation", 4),
    ("grass", 3, "Nature", 4),
    ("leaves", 3, "Nature", 4),
    ("clouds", 3, "Nature", 4),
    ("rain", 3, "Nature", 4),
    ("snow", 3, "Nature", 4),
    ("wind", 3, "Nature", 4),
    ("ocean", 3, "Nature", 4),
    ("mountain", 3, "Nature", 5),
    ("excited", 3, "Emotions", 4),
    ("scared", 3, "Emotions", 4),
    ("surprised", 3, "Emotions", 5),
    ("angry", 3, "Emotions", 4),
    ("tired", 3, "Emotions", 4),
    ("proud", 3, "Emotions", 4),
    ("sharing", 3, "Social", 4),
    ("helping", 3, "Social", 4),
    ("listening", 3, "Social", 4),
    ("waiting", 3, "Social", 4),
    ("turn", 3, "Social", 4),
    ("polite", 3, "Social", 5),
    ("puzzle", 3, "Toys", 4),
    ("blocks", 3, "Toys", 4),
    ("crayons", 3, "Toys", 4),
    ("dollhouse", 3, "Toys", 5),
];

/// What a seeding run touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub categories: usize,
    pub words: usize,
    pub exercises: usize,
}

fn images(choices: &[(&str, bool, &str)]) -> Vec<ImageChoice> {
    choices
        .iter()
        .map(|(url, is_correct, alt)| ImageChoice {
            url: (*url).to_string(),
            is_correct: *is_correct,
            alt: (*alt).to_string(),
        })
        .collect()
}

fn recognition(
    target: &str,
    choices: &[(&str, bool, &str)],
    instruction: &str,
) -> ExerciseContent {
    ExerciseContent::WordRecognition {
        target_word: target.to_string(),
        images: images(choices),
        instruction: instruction.to_string(),
    }
}

fn matching(pairs: &[(&str, &str)], instruction: &str) -> ExerciseContent {
    ExerciseContent::Matching {
        pairs: pairs
            .iter()
            .map(|(word, image_url)| MatchPair {
                word: (*word).to_string(),
                image_url: (*image_url).to_string(),
            })
            .collect(),
        instruction: instruction.to_string(),
    }
}

fn fill_in(
    sentence: &str,
    options: &[&str],
    answer: &str,
    image: &str,
    instruction: &str,
) -> ExerciseContent {
    ExerciseContent::FillInBlank {
        sentence: sentence.to_string(),
        options: options.iter().map(|o| (*o).to_string()).collect(),
        correct_answer: answer.to_string(),
        image_url: Some(image.to_string()),
        instruction: instruction.to_string(),
    }
}

fn categorize(
    buckets: &[(&str, &str)],
    items: &[(&str, &str, &str)],
    instruction: &str,
) -> ExerciseContent {
    ExerciseContent::Categorization {
        categories: buckets
            .iter()
            .map(|(name, icon)| Bucket {
                name: (*name).to_string(),
                icon: (*icon).to_string(),
            })
            .collect(),
        items: items
            .iter()
            .map(|(word, image_url, correct)| SortItem {
                word: (*word).to_string(),
                image_url: (*image_url).to_string(),
                correct_category: (*correct).to_string(),
            })
            .collect(),
        instruction: instruction.to_string(),
    }
}

fn template(
    title: &str,
    description: &str,
    level: Level,
    category: Option<CategoryId>,
    content: ExerciseContent,
) -> NewExercise {
    NewExercise {
        title: title.to_string(),
        description: description.to_string(),
        level,
        category,
        content,
    }
}

/// Built-in exercise templates. `categories` maps category names to the ids
/// assigned by the store.
#[must_use]
pub fn exercise_templates(categories: &BTreeMap<String, CategoryId>) -> Vec<NewExercise> {
    let cat = |name: &str| categories.get(name).copied();
    vec![
        template(
            "Point to Mama",
            "Help your child identify family members",
            Level::EarlySounds,
            cat("Family"),
            recognition(
                "mama",
                &[
                    ("/images/mama.jpg", true, "Mother holding baby"),
                    ("/images/dada.jpg", false, "Father with child"),
                    ("/images/baby.jpg", false, "Baby playing"),
                ],
                "Point to mama!",
            ),
        ),
        template(
            "Say Bye-Bye",
            "Practice waving and saying goodbye",
            Level::EarlySounds,
            cat("Social"),
            ExerciseContent::Pronunciation {
                target_word: "bye".into(),
                audio_url: "/audio/bye.mp3".into(),
                phonetics: None,
                instruction: "Wave your hand and say 'bye-bye'".into(),
                tips: vec![
                    "Make it fun with exaggerated waving".into(),
                    "Repeat several times".into(),
                ],
            },
        ),
        template(
            "More Milk",
            "Learn to ask for more",
            Level::EarlySounds,
            cat("Food"),
            recognition(
                "more",
                &[
                    ("/images/more-milk.jpg", true, "Glass of milk"),
                    ("/images/empty-cup.jpg", false, "Empty cup"),
                    ("/images/water.jpg", false, "Glass of water"),
                ],
                "Which one shows MORE milk?",
            ),
        ),
        template(
            "Animal Sounds",
            "Match animals with their sounds",
            Level::FirstWords,
            cat("Animals"),
            matching(
                &[
                    ("moo", "/images/cow.jpg"),
                    ("woof", "/images/dog.jpg"),
                    ("meow", "/images/cat.jpg"),
                ],
                "Match each animal with its sound!",
            ),
        ),
        template(
            "Body Parts Song",
            "Point to body parts while singing",
            Level::FirstWords,
            cat("Body Parts"),
            recognition(
                "nose",
                &[
                    ("/images/nose.jpg", true, "Child touching nose"),
                    ("/images/eye.jpg", false, "Child pointing to eye"),
                    ("/images/mouth.jpg", false, "Child pointing to mouth"),
                ],
                "Touch your nose!",
            ),
        ),
        template(
            "Two-Word Phrases",
            "Practice combining words",
            Level::FirstWords,
            cat("Food"),
            fill_in(
                "More {blank}",
                &["milk", "water", "juice"],
                "milk",
                "/images/milk-glass.jpg",
                "What do you want more of?",
            ),
        ),
        template(
            "Sort the Animals",
            "Put animals in the right groups",
            Level::WordCombinations,
            cat("Animals"),
            categorize(
                &[("Farm Animals", "🚜"), ("Wild Animals", "🌳"), ("Pets", "🏠")],
                &[
                    ("cow", "/images/cow.jpg", "Farm Animals"),
                    ("lion", "/images/lion.jpg", "Wild Animals"),
                    ("dog", "/images/dog.jpg", "Pets"),
                    ("pig", "/images/pig.jpg", "Farm Animals"),
                    ("cat", "/images/cat.jpg", "Pets"),
                    ("elephant", "/images/elephant.jpg", "Wild Animals"),
                ],
                "Put each animal where it belongs!",
            ),
        ),
        template(
            "Color Hunt",
            "Find objects of specific colors",
            Level::WordCombinations,
            cat("Colors"),
            recognition(
                "red",
                &[
                    ("/images/red-apple.jpg", true, "Red apple"),
                    ("/images/blue-ball.jpg", false, "Blue ball"),
                    ("/images/yellow-banana.jpg", false, "Yellow banana"),
                    ("/images/red-car.jpg", true, "Red car"),
                ],
                "Find all the RED things!",
            ),
        ),
        template(
            "Complete the Sentence",
            "Fill in missing words in sentences",
            Level::WordCombinations,
            None,
            fill_in(
                "The cat is {blank} the chair.",
                &["on", "under", "beside"],
                "on",
                "/images/cat-on-chair.jpg",
                "Where is the cat?",
            ),
        ),
        template(
            "First Sound Game",
            "Identify words that start with the same sound",
            Level::WordCombinations,
            None,
            ExerciseContent::SoundRecognition {
                target_sound: "b".into(),
                words: [
                    ("ball", true),
                    ("cat", false),
                    ("book", true),
                    ("dog", false),
                ]
                .iter()
                .map(|(word, has_target_sound)| SoundWord {
                    word: (*word).to_string(),
                    has_target_sound: *has_target_sound,
                    audio_url: format!("/audio/{}.mp3", word),
                })
                .collect(),
                instruction: "Which words start with the 'b' sound?".into(),
            },
        ),
        template(
            "Tell a Story",
            "Create a story using specific words",
            Level::ComplexSpeech,
            None,
            ExerciseContent::StoryTelling {
                story_prompt: "Tell me about a day at the park".into(),
                target_words: ["playground", "swing", "slide", "friends", "fun"]
                    .iter()
                    .map(|w| (*w).to_string())
                    .collect(),
                image_prompts: vec!["/images/park.jpg".into(), "/images/playground.jpg".into()],
                instruction:
                    "Use these words to tell your story: playground, swing, slide, friends, fun"
                        .into(),
            },
        ),
        template(
            "Emotion Detective",
            "Identify emotions in different situations",
            Level::ComplexSpeech,
            cat("Emotions"),
            recognition(
                "excited",
                &[
                    ("/images/excited-child.jpg", true, "Child jumping with joy"),
                    ("/images/sad-child.jpg", false, "Child looking sad"),
                    ("/images/angry-child.jpg", false, "Child looking angry"),
                    ("/images/scared-child.jpg", false, "Child looking scared"),
                ],
                "Which child looks EXCITED?",
            ),
        ),
        template(
            "Rhyme Time",
            "Find words that rhyme",
            Level::ComplexSpeech,
            None,
            matching(
                &[
                    ("cat", "/images/cat.jpg"),
                    ("hat", "/images/hat.jpg"),
                    ("dog", "/images/dog.jpg"),
                    ("frog", "/images/frog.jpg"),
                ],
                "Match the words that rhyme!",
            ),
        ),
        template(
            "Complex Sentences",
            "Build longer, more complex sentences",
            Level::ComplexSpeech,
            None,
            fill_in(
                "Yesterday I {blank} to the store with my mom.",
                &["go", "went", "going"],
                "went",
                "/images/shopping.jpg",
                "Choose the correct word for past tense",
            ),
        ),
        template(
            "Sequence Story",
            "Put story events in the right order",
            Level::ComplexSpeech,
            None,
            categorize(
                &[("First", "1️⃣"), ("Second", "2️⃣"), ("Third", "3️⃣")],
                &[
                    ("Wake up", "/images/wake-up.jpg", "First"),
                    ("Eat breakfast", "/images/breakfast.jpg", "Second"),
                    ("Go to school", "/images/school.jpg", "Third"),
                ],
                "Put these morning activities in order!",
            ),
        ),
    ]
}

/// Load the built-in catalogue into `store`.
pub fn seed<S: Store + ?Sized>(store: &S) -> Result<SeedReport> {
    let mut ids: BTreeMap<String, CategoryId> = BTreeMap::new();
    for (name, description, icon) in CATEGORIES {
        let category = store.upsert_category(NewCategory {
            name: (*name).to_string(),
            description: (*description).to_string(),
            icon: (*icon).to_string(),
        })?;
        ids.insert(category.name, category.id);
    }

    for (text, level, category, difficulty) in WORDS {
        let category = ids.get(*category).copied().ok_or_else(|| {
            CoreError::NotFound(format!("seed category '{}' for word '{}'", category, text))
        })?;
        store.upsert_word(NewWord {
            text: (*text).to_string(),
            level: Level::try_from(*level)?,
            category,
            difficulty: *difficulty,
        })?;
    }

    let templates = exercise_templates(&ids);
    let exercises = templates.len();
    for exercise in templates {
        store.upsert_exercise(exercise)?;
    }

    Ok(SeedReport {
        categories: CATEGORIES.len(),
        words: WORDS.len(),
        exercises,
    })
}
