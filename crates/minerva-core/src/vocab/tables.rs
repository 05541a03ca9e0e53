use std::sync::LazyLock;

use super::{Namespace, Term, Vocabulary};

const fn schema(local: &'static str) -> Option<Term> {
    Some(Term::new(Namespace::Schema, local))
}

const fn hcrt(local: &'static str) -> Option<Term> {
    Some(Term::new(Namespace::Hcrt, local))
}

const fn modalia(local: &'static str) -> Option<Term> {
    Some(Term::new(Namespace::Modalia, local))
}

const fn bibo(local: &'static str) -> Option<Term> {
    Some(Term::new(Namespace::Bibo, local))
}

/// Free-text TeSS `resource-type` labels.
const TESS_RESOURCE_TYPE_TABLE: &[(&str, Option<Term>)] = &[
    ("video", schema("VideoObject")),
    ("series of videos", schema("VideoObject")),
    ("youtube video", schema("VideoObject")),
    ("computer software", schema("SoftwareSourceCode")),
    ("coding", schema("SoftwareSourceCode")),
    ("scripts", schema("SoftwareSourceCode")),
    ("programming", schema("SoftwareSourceCode")),
    ("poster", schema("Poster")),
    ("workshop", modalia("Workshop")),
    ("podcast", schema("PodcastEpisode")),
    ("slidedeck", hcrt("slide")),
    ("slideshow", hcrt("slide")),
    ("slides", hcrt("slide")),
    ("slide deck / presentation", hcrt("slide")),
    ("slides / presentation", hcrt("slide")),
    ("slideck/ presentation", hcrt("slide")),
    ("presentation", hcrt("slide")),
    ("jupyter notebooks", modalia("CodeNotebook")),
    ("jupyter notebook", modalia("CodeNotebook")),
    ("book", bibo("book")),
    ("blog post", None),
    ("training materials", None),
    ("examples", None),
    ("documentation", None),
    ("bioinformatics", None),
    ("hands-on tutorial", None),
    ("learning pathway", None),
    ("tutorials", None),
    ("handbook", None),
    ("case studies", None),
    ("implementation guidelines", None),
    ("additional reading", None),
    ("didactic activities", None),
    ("mock data", None),
    ("how-to guide", None),
    ("online course", None),
    ("online material", None),
    ("education", None),
    ("open educational resource", None),
    ("tool", None),
    ("toolkit", None),
    ("e-learning + workshop", None),
    ("pdf", None),
    ("recording", None),
    ("r shiny application", None),
    ("free online course", None),
    ("carpentries style curriculum", None),
    ("training materials with mock data", None),
    ("online modules", None),
    ("hackathon", None),
    ("vignette", None),
    ("api reference", None),
    ("educational materials", None),
    ("exercise", None),
    ("handout", None),
    ("workflow", None),
    ("installation instructions", None),
    ("manual", None),
    ("talk", None),
    ("knowledgebase", None),
    ("notes", None),
    // Topics that curators entered as resource types
    ("computational biology", None),
    ("computer science", None),
    ("data science", None),
    ("transcriptomics", None),
    ("machine learning", None),
    // Databases
    ("life sciences literature database", None),
    ("life science literature database", None),
    ("viralzone", None),
];

const TESS_DIFFICULTY_LEVEL_TABLE: &[(&str, Option<Term>)] = &[
    ("advanced", modalia("Expert")),
    ("beginner", modalia("Beginner")),
    ("intermediate", modalia("Competent")),
    ("notspecified", None),
];

const DALIA_PROFICIENCY_LEVEL_TABLE: &[(&str, Option<Term>)] = &[
    ("novice", modalia("Novice")),
    ("beginner", modalia("Beginner")),
    ("advanced beginner", modalia("AdvancedBeginner")),
    ("competent", modalia("Competent")),
    ("intermediate", modalia("Competent")),
    ("proficient", modalia("Proficient")),
    ("expert", modalia("Expert")),
    ("advanced", modalia("Expert")),
    ("notspecified", None),
];

const DALIA_TARGET_GROUP_TABLE: &[(&str, Option<Term>)] = &[
    ("student", modalia("Student")),
    ("students", modalia("Student")),
    ("student (ba)", modalia("StudentBA")),
    ("student (ma)", modalia("StudentMA")),
    ("phd student", modalia("PhDStudent")),
    ("teacher", modalia("Teacher")),
    ("researcher", modalia("Researcher")),
    ("data steward", modalia("DataSteward")),
    ("research software engineer", modalia("ResearchSoftwareEngineer")),
    ("research group leader", modalia("ResearchGroupLeader")),
    ("research funder", modalia("ResearchFunder")),
    ("librarian", modalia("Librarian")),
    ("general public", None),
];

const DALIA_LEARNING_RESOURCE_TYPE_TABLE: &[(&str, Option<Term>)] = &[
    ("application", hcrt("application")),
    ("assessment", hcrt("assessment")),
    ("audio", hcrt("audio")),
    ("case study", hcrt("case_study")),
    ("code", schema("SoftwareSourceCode")),
    ("code notebook", modalia("CodeNotebook")),
    ("course", hcrt("course")),
    ("data", hcrt("data")),
    ("diagram", hcrt("diagram")),
    ("drill and practice", hcrt("drill_and_practice")),
    ("educational game", hcrt("educational_game")),
    ("experiment", hcrt("experiment")),
    ("exploration", hcrt("exploration")),
    ("image", hcrt("image")),
    ("lesson plan", hcrt("lesson_plan")),
    ("map", hcrt("map")),
    ("podcast", schema("PodcastEpisode")),
    ("poster", schema("Poster")),
    ("questionnaire", hcrt("questionnaire")),
    ("script", hcrt("script")),
    ("simulation", hcrt("simulation")),
    ("slide", hcrt("slide")),
    ("slides", hcrt("slide")),
    ("text", hcrt("text")),
    ("textbook", hcrt("textbook")),
    ("book", bibo("book")),
    ("tutorial", hcrt("tutorial")),
    ("video", schema("VideoObject")),
    ("web page", hcrt("web_page")),
    ("worksheet", hcrt("worksheet")),
    ("workshop", modalia("Workshop")),
    ("other", None),
];

const DALIA_MEDIA_TYPE_TABLE: &[(&str, Option<Term>)] = &[
    ("audio", modalia("Audio")),
    ("image", modalia("Image")),
    ("multipart", modalia("Multipart")),
    ("text", modalia("Text")),
    ("video", modalia("Video")),
];

/// ISO 639-1 code, ISO 639-3 code and English name for each supported language.
const LANGUAGE_TABLE: &[(&str, &str, &str)] = &[
    ("ar", "ara", "arabic"),
    ("ca", "cat", "catalan"),
    ("cs", "ces", "czech"),
    ("da", "dan", "danish"),
    ("de", "deu", "german"),
    ("el", "ell", "greek"),
    ("en", "eng", "english"),
    ("es", "spa", "spanish"),
    ("et", "est", "estonian"),
    ("fi", "fin", "finnish"),
    ("fr", "fra", "french"),
    ("hr", "hrv", "croatian"),
    ("hu", "hun", "hungarian"),
    ("it", "ita", "italian"),
    ("ja", "jpn", "japanese"),
    ("ko", "kor", "korean"),
    ("la", "lat", "latin"),
    ("lt", "lit", "lithuanian"),
    ("lv", "lav", "latvian"),
    ("nl", "nld", "dutch"),
    ("no", "nor", "norwegian"),
    ("pl", "pol", "polish"),
    ("pt", "por", "portuguese"),
    ("ro", "ron", "romanian"),
    ("ru", "rus", "russian"),
    ("sk", "slk", "slovak"),
    ("sl", "slv", "slovenian"),
    ("sv", "swe", "swedish"),
    ("tr", "tur", "turkish"),
    ("uk", "ukr", "ukrainian"),
    ("zh", "zho", "chinese"),
];

pub static TESS_RESOURCE_TYPES: LazyLock<Vocabulary<Term>> = LazyLock::new(|| {
    Vocabulary::new("resource-type", TESS_RESOURCE_TYPE_TABLE.iter().copied())
});

pub static TESS_DIFFICULTY_LEVELS: LazyLock<Vocabulary<Term>> = LazyLock::new(|| {
    Vocabulary::new("difficulty-level", TESS_DIFFICULTY_LEVEL_TABLE.iter().copied())
});

pub static DALIA_PROFICIENCY_LEVELS: LazyLock<Vocabulary<Term>> = LazyLock::new(|| {
    Vocabulary::new("proficiency-level", DALIA_PROFICIENCY_LEVEL_TABLE.iter().copied())
});

pub static DALIA_TARGET_GROUPS: LazyLock<Vocabulary<Term>> = LazyLock::new(|| {
    Vocabulary::new("target-group", DALIA_TARGET_GROUP_TABLE.iter().copied())
});

pub static DALIA_LEARNING_RESOURCE_TYPES: LazyLock<Vocabulary<Term>> = LazyLock::new(|| {
    Vocabulary::new(
        "learning-resource-type",
        DALIA_LEARNING_RESOURCE_TYPE_TABLE.iter().copied(),
    )
});

pub static DALIA_MEDIA_TYPES: LazyLock<Vocabulary<Term>> =
    LazyLock::new(|| Vocabulary::new("media-type", DALIA_MEDIA_TYPE_TABLE.iter().copied()));

/// Language labels (two-letter code, three-letter code or English name) to ISO 639-3.
pub static LANGUAGES: LazyLock<Vocabulary<&'static str>> = LazyLock::new(|| {
    let entries = LANGUAGE_TABLE.iter().flat_map(|&(alpha2, alpha3, name)| {
        [
            (alpha2, Some(alpha3)),
            (alpha3, Some(alpha3)),
            (name, Some(alpha3)),
        ]
    });
    Vocabulary::new(
        "language",
        entries.chain([("mul", None), ("zxx", None)]),
    )
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::UnknownValues;
    use crate::vocab::Lookup;

    #[test]
    fn test_null_resource_types_produce_no_diagnostic() {
        let mut unknown = UnknownValues::new();
        let nulls: Vec<&str> = TESS_RESOURCE_TYPE_TABLE
            .iter()
            .filter(|(_, term)| term.is_none())
            .map(|(label, _)| *label)
            .collect();
        assert!(!nulls.is_empty());

        let mapped = TESS_RESOURCE_TYPES.map_all(nulls.iter().copied(), &mut unknown);
        assert!(mapped.is_empty());
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_slide_synonyms_collapse() {
        let mut unknown = UnknownValues::new();
        let terms = TESS_RESOURCE_TYPES.map_all(
            ["Slides", "slideshow", "Slide deck / presentation"],
            &mut unknown,
        );
        assert_eq!(terms, vec![Term::new(Namespace::Hcrt, "slide")]);
    }

    #[test]
    fn test_difficulty_levels() {
        assert_eq!(
            TESS_DIFFICULTY_LEVELS.lookup("Intermediate"),
            Lookup::Mapped(Term::new(Namespace::Modalia, "Competent"))
        );
        assert_eq!(TESS_DIFFICULTY_LEVELS.lookup("notspecified"), Lookup::Unmapped);
        assert_eq!(TESS_DIFFICULTY_LEVELS.lookup("wizard"), Lookup::Unknown);
    }

    #[test]
    fn test_languages_accept_codes_and_names() {
        assert_eq!(LANGUAGES.lookup("en"), Lookup::Mapped("eng"));
        assert_eq!(LANGUAGES.lookup("ENG"), Lookup::Mapped("eng"));
        assert_eq!(LANGUAGES.lookup("German"), Lookup::Mapped("deu"));
        assert_eq!(LANGUAGES.lookup("mul"), Lookup::Unmapped);
        assert_eq!(LANGUAGES.lookup("xx"), Lookup::Unknown);
    }

    #[test]
    fn test_dalia_tables_are_populated() {
        assert!(!DALIA_PROFICIENCY_LEVELS.is_empty());
        assert!(!DALIA_TARGET_GROUPS.is_empty());
        assert!(!DALIA_LEARNING_RESOURCE_TYPES.is_empty());
        assert_eq!(DALIA_MEDIA_TYPES.len(), 5);
    }
}
