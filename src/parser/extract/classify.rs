use crate::model::CourseType;

/// Course-type policy. The extractor only calls it; callers may swap in their own.
pub trait CourseClassifier: Send + Sync {
    fn classify(
        &self,
        code: &str,
        name: Option<&str>,
        ccn: Option<&str>,
        description: Option<&str>,
    ) -> CourseType;
}

const GENERAL_EDUCATION_SUBJECTS: &[&str] = &[
    "ENGL", "MATH", "HIST", "BIOL", "CHEM", "PHYS", "PSYC", "SOCI", "HUMN", "COMM",
    "ECON", "SCIE", "POLS", "GEOG", "ARTS", "PHIL", "STAT",
];

/// Keyword defaults: capstone and elective by name, general education by CCN subject.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl CourseClassifier for KeywordClassifier {
    fn classify(
        &self,
        _code: &str,
        name: Option<&str>,
        ccn: Option<&str>,
        description: Option<&str>,
    ) -> CourseType {
        let name = name.unwrap_or("").to_lowercase();
        if name.contains("capstone") {
            return CourseType::Capstone;
        }
        if name.contains("elective")
            || description.is_some_and(|d| d.to_lowercase().contains("elective"))
        {
            return CourseType::Elective;
        }
        let subject = ccn.and_then(|c| c.split_whitespace().next()).unwrap_or("");
        if GENERAL_EDUCATION_SUBJECTS.contains(&subject) {
            return CourseType::GeneralEducation;
        }
        CourseType::Core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_policy() {
        let c = KeywordClassifier;
        assert_eq!(c.classify("C769", Some("IT Capstone Written Project"), None, None), CourseType::Capstone);
        assert_eq!(c.classify("C278", Some("College Algebra"), Some("MATH 1010"), None), CourseType::GeneralEducation);
        assert_eq!(c.classify("D100", Some("Free Elective"), None, None), CourseType::Elective);
        assert_eq!(c.classify("C182", Some("Introduction to IT"), Some("ITEC 1010"), None), CourseType::Core);
        assert_eq!(c.classify("C182", None, None, None), CourseType::Core);
    }
}
