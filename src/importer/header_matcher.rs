// ==========================================
// 学校管理门户 - 表头自动映射
// ==========================================
// 阶段 1: 根据关键字对为 COLUMN 字段预填表头
// 规则: 按表头顺序扫描，首个命中即采用（first match wins）
// 限制: 不做跨字段唯一性约束，两个字段可命中同一表头
// ==========================================

use crate::domain::{ColumnAssignment, FieldMapping};
use crate::importer::import_mapper_trait::HeaderMatcher;
use tracing::debug;

// ==========================================
// 关键字规则
// ==========================================
// 表头与标签均已转小写
#[derive(Debug, Clone, Copy)]
enum KeywordRule {
    /// 双方均包含任一关键字
    Both(&'static [&'static str]),
    /// 表头包含 header_kw 且标签包含 label_kw
    Asymmetric {
        header_kw: &'static str,
        label_kw: &'static str,
    },
    /// 双方均包含 "nom"，且是否为"prénom"一致
    Name,
}

const PRENOM_VARIANTS: &[&str] = &["prénom", "prenom"];

const RULES: &[KeywordRule] = &[
    KeywordRule::Name,
    KeywordRule::Both(&["email"]),
    KeywordRule::Asymmetric {
        header_kw: "mail",
        label_kw: "email",
    },
    KeywordRule::Both(&["téléphone", "telephone", "phone", "contact"]),
    KeywordRule::Both(&["sexe"]),
    KeywordRule::Both(&["date"]),
    KeywordRule::Both(&["lieu"]),
    KeywordRule::Both(&["matricule"]),
];

fn is_prenom(text: &str) -> bool {
    PRENOM_VARIANTS.iter().any(|kw| text.contains(kw))
}

impl KeywordRule {
    fn matches(&self, header: &str, label: &str) -> bool {
        match self {
            KeywordRule::Both(keywords) => keywords
                .iter()
                .any(|kw| header.contains(kw) && label.contains(kw)),
            KeywordRule::Asymmetric {
                header_kw,
                label_kw,
            } => header.contains(header_kw) && label.contains(label_kw),
            KeywordRule::Name => {
                header.contains("nom")
                    && label.contains("nom")
                    && is_prenom(header) == is_prenom(label)
            }
        }
    }
}

// ==========================================
// KeywordHeaderMatcher
// ==========================================
pub struct KeywordHeaderMatcher;

impl KeywordHeaderMatcher {
    /// 表头与字段标签是否匹配（任一规则命中）
    pub fn header_matches(&self, header: &str, label: &str) -> bool {
        let header = header.to_lowercase();
        let label = label.to_lowercase();
        RULES.iter().any(|rule| rule.matches(&header, &label))
    }
}

impl HeaderMatcher for KeywordHeaderMatcher {
    fn suggest(&self, fields: &[FieldMapping], headers: &[String]) -> ColumnAssignment {
        let mut assignment = ColumnAssignment::new();

        for field in fields.iter().filter(|f| f.is_column()) {
            if let Some(header) = headers
                .iter()
                .find(|h| !h.trim().is_empty() && self.header_matches(h, &field.label))
            {
                assignment.assign(field.key.clone(), header.clone());
            }
        }

        debug!(
            fields = fields.len(),
            headers = headers.len(),
            mapped = assignment.len(),
            "表头自动映射完成"
        );
        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|h| h.to_string()).collect()
    }

    fn student_fields() -> Vec<FieldMapping> {
        vec![
            FieldMapping::sheet_name("curriculum_code", "Code cursus").required(),
            FieldMapping::column("last_name", "Nom").required(),
            FieldMapping::column("first_name", "Prénom").required(),
            FieldMapping::column("email", "Email"),
            FieldMapping::column("phone", "Téléphone"),
            FieldMapping::column("gender", "Sexe"),
            FieldMapping::column("birth_date", "Date de naissance"),
            FieldMapping::column("birth_place", "Lieu de naissance"),
            FieldMapping::column("student_number", "Matricule"),
        ]
    }

    #[test]
    fn test_suggest_typical_student_sheet() {
        let matcher = KeywordHeaderMatcher;
        let sheet_headers = headers(&[
            "MATRICULE",
            "NOM",
            "PRENOM",
            "SEXE",
            "DATE NAISSANCE",
            "LIEU NAISSANCE",
            "E-mail",
            "Contact",
        ]);

        let assignment = matcher.suggest(&student_fields(), &sheet_headers);

        assert_eq!(assignment.get("last_name"), Some("NOM"));
        assert_eq!(assignment.get("first_name"), Some("PRENOM"));
        assert_eq!(assignment.get("email"), Some("E-mail"));
        assert_eq!(assignment.get("gender"), Some("SEXE"));
        assert_eq!(assignment.get("birth_date"), Some("DATE NAISSANCE"));
        assert_eq!(assignment.get("birth_place"), Some("LIEU NAISSANCE"));
        assert_eq!(assignment.get("student_number"), Some("MATRICULE"));
        // Téléphone / Contact 不共享关键字
        assert_eq!(assignment.get("phone"), None);
        // SHEET_NAME 字段从不参与列映射
        assert_eq!(assignment.get("curriculum_code"), None);
    }

    #[test]
    fn test_first_matching_header_wins() {
        let matcher = KeywordHeaderMatcher;
        let fields = vec![FieldMapping::column("birth_date", "Date de naissance")];
        let sheet_headers = headers(&["Date inscription", "Date de naissance"]);

        let assignment = matcher.suggest(&fields, &sheet_headers);

        assert_eq!(assignment.get("birth_date"), Some("Date inscription"));
    }

    #[test]
    fn test_two_fields_may_share_one_header() {
        let matcher = KeywordHeaderMatcher;
        let fields = vec![
            FieldMapping::column("birth_date", "Date de naissance"),
            FieldMapping::column("enrolment_date", "Date d'inscription"),
        ];
        let sheet_headers = headers(&["Nom", "Date"]);

        let assignment = matcher.suggest(&fields, &sheet_headers);

        assert_eq!(assignment.get("birth_date"), Some("Date"));
        assert_eq!(assignment.get("enrolment_date"), Some("Date"));
    }

    #[test]
    fn test_suggest_is_deterministic() {
        let matcher = KeywordHeaderMatcher;
        let sheet_headers = headers(&["Nom", "Prénom", "Mail", "Téléphone parent"]);
        let fields = student_fields();

        let first = matcher.suggest(&fields, &sheet_headers);
        let second = matcher.suggest(&fields, &sheet_headers);

        assert_eq!(first, second);
        assert_eq!(first.get("email"), Some("Mail"));
        assert_eq!(first.get("phone"), Some("Téléphone parent"));
    }

    #[test]
    fn test_prenom_header_never_taken_for_last_name() {
        // "prénom" 含有 "nom"：名字列排在前面时，姓氏字段仍需跳过它
        let matcher = KeywordHeaderMatcher;
        let sheet_headers = headers(&["Prénom", "Nom de famille"]);

        let assignment = matcher.suggest(&student_fields(), &sheet_headers);

        assert_eq!(assignment.get("last_name"), Some("Nom de famille"));
        assert_eq!(assignment.get("first_name"), Some("Prénom"));
        assert!(!matcher.header_matches("Prenom", "Nom"));
        assert!(!matcher.header_matches("Nom", "Prénom"));
    }

    #[test]
    fn test_no_match_leaves_field_unmapped() {
        let matcher = KeywordHeaderMatcher;
        let fields = vec![FieldMapping::column("level", "Niveau")];
        let assignment = matcher.suggest(&fields, &headers(&["Classe", "Groupe"]));
        assert!(assignment.is_empty());
    }

    #[test]
    fn test_blank_headers_are_never_suggested() {
        let matcher = KeywordHeaderMatcher;
        let fields = vec![FieldMapping::column("last_name", "Nom")];
        let assignment = matcher.suggest(&fields, &headers(&["", "Nom"]));
        assert_eq!(assignment.get("last_name"), Some("Nom"));
    }
}
