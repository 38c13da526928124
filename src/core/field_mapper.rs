use crate::domain::model::{CellValue, ExternalRow, FieldIssue, PlayerDraft, PreferredFoot};
use crate::utils::error::{ImportError, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// 預設映射表：試算表欄位標題 (義大利文，部分含尾端空白) -> 標準欄位
pub const DEFAULT_MAPPING: [(&str, TargetField); 19] = [
    ("Nome", TargetField::Name),
    ("Anno", TargetField::BirthYear),
    ("Squadra", TargetField::Team),
    ("Naz", TargetField::Nationality),
    ("Ruolo Generale", TargetField::GeneralRole),
    ("Posizone", TargetField::SpecificPosition),
    ("Funzioni/Etichette", TargetField::FunctionsLabels),
    ("Piede", TargetField::PreferredFoot),
    ("Atletismo", TargetField::Athleticism),
    ("Valutazione Atletica", TargetField::AthleticEvaluation),
    ("Caratteristiche Chiave", TargetField::KeyCharacteristics),
    ("Valore Potenziale ", TargetField::PotentialValue),
    ("Valore Attuale  Dati", TargetField::CurrentValue),
    ("Valore Potenziale Dati", TargetField::DataPotentialValue),
    ("Note ", TargetField::Notes),
    ("Transfermarket", TargetField::TransfermarketLink),
    ("Director Feedback ", TargetField::DirectorFeedback),
    ("CHECK", TargetField::CheckType),
    ("ESITO", TargetField::Outcome),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetField {
    Name,
    BirthYear,
    Team,
    Nationality,
    GeneralRole,
    SpecificPosition,
    FunctionsLabels,
    PreferredFoot,
    Athleticism,
    AthleticEvaluation,
    KeyCharacteristics,
    PotentialValue,
    CurrentValue,
    DataPotentialValue,
    Notes,
    TransfermarketLink,
    DirectorFeedback,
    CheckType,
    Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Foot,
}

impl TargetField {
    pub const ALL: [TargetField; 19] = [
        TargetField::Name,
        TargetField::BirthYear,
        TargetField::Team,
        TargetField::Nationality,
        TargetField::GeneralRole,
        TargetField::SpecificPosition,
        TargetField::FunctionsLabels,
        TargetField::PreferredFoot,
        TargetField::Athleticism,
        TargetField::AthleticEvaluation,
        TargetField::KeyCharacteristics,
        TargetField::PotentialValue,
        TargetField::CurrentValue,
        TargetField::DataPotentialValue,
        TargetField::Notes,
        TargetField::TransfermarketLink,
        TargetField::DirectorFeedback,
        TargetField::CheckType,
        TargetField::Outcome,
    ];

    /// 儲存端的欄位名稱
    pub fn column(self) -> &'static str {
        match self {
            TargetField::Name => "name",
            TargetField::BirthYear => "birth_year",
            TargetField::Team => "team",
            TargetField::Nationality => "nationality",
            TargetField::GeneralRole => "general_role",
            TargetField::SpecificPosition => "specific_position",
            TargetField::FunctionsLabels => "functions_labels",
            TargetField::PreferredFoot => "preferred_foot",
            TargetField::Athleticism => "athleticism",
            TargetField::AthleticEvaluation => "athletic_evaluation",
            TargetField::KeyCharacteristics => "key_characteristics",
            TargetField::PotentialValue => "potential_value",
            TargetField::CurrentValue => "current_value",
            TargetField::DataPotentialValue => "data_potential_value",
            TargetField::Notes => "notes",
            TargetField::TransfermarketLink => "transfermarket_link",
            TargetField::DirectorFeedback => "director_feedback",
            TargetField::CheckType => "check_type",
            TargetField::Outcome => "outcome",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            TargetField::BirthYear
            | TargetField::AthleticEvaluation
            | TargetField::PotentialValue
            | TargetField::CurrentValue
            | TargetField::DataPotentialValue => FieldKind::Integer,
            TargetField::PreferredFoot => FieldKind::Foot,
            _ => FieldKind::Text,
        }
    }

    fn text_slot(self, draft: &mut PlayerDraft) -> Option<&mut Option<String>> {
        match self {
            TargetField::Name => Some(&mut draft.name),
            TargetField::Team => Some(&mut draft.team),
            TargetField::Nationality => Some(&mut draft.nationality),
            TargetField::GeneralRole => Some(&mut draft.general_role),
            TargetField::SpecificPosition => Some(&mut draft.specific_position),
            TargetField::FunctionsLabels => Some(&mut draft.functions_labels),
            TargetField::Athleticism => Some(&mut draft.athleticism),
            TargetField::KeyCharacteristics => Some(&mut draft.key_characteristics),
            TargetField::Notes => Some(&mut draft.notes),
            TargetField::TransfermarketLink => Some(&mut draft.transfermarket_link),
            TargetField::DirectorFeedback => Some(&mut draft.director_feedback),
            TargetField::CheckType => Some(&mut draft.check_type),
            TargetField::Outcome => Some(&mut draft.outcome),
            _ => None,
        }
    }

    fn integer_slot(self, draft: &mut PlayerDraft) -> Option<&mut Option<i32>> {
        match self {
            TargetField::BirthYear => Some(&mut draft.birth_year),
            TargetField::AthleticEvaluation => Some(&mut draft.athletic_evaluation),
            TargetField::PotentialValue => Some(&mut draft.potential_value),
            TargetField::CurrentValue => Some(&mut draft.current_value),
            TargetField::DataPotentialValue => Some(&mut draft.data_potential_value),
            _ => None,
        }
    }

    fn is_set(self, draft: &PlayerDraft) -> bool {
        match self {
            TargetField::Name => draft.name.is_some(),
            TargetField::BirthYear => draft.birth_year.is_some(),
            TargetField::Team => draft.team.is_some(),
            TargetField::Nationality => draft.nationality.is_some(),
            TargetField::GeneralRole => draft.general_role.is_some(),
            TargetField::SpecificPosition => draft.specific_position.is_some(),
            TargetField::FunctionsLabels => draft.functions_labels.is_some(),
            TargetField::PreferredFoot => draft.preferred_foot.is_some(),
            TargetField::Athleticism => draft.athleticism.is_some(),
            TargetField::AthleticEvaluation => draft.athletic_evaluation.is_some(),
            TargetField::KeyCharacteristics => draft.key_characteristics.is_some(),
            TargetField::PotentialValue => draft.potential_value.is_some(),
            TargetField::CurrentValue => draft.current_value.is_some(),
            TargetField::DataPotentialValue => draft.data_potential_value.is_some(),
            TargetField::Notes => draft.notes.is_some(),
            TargetField::TransfermarketLink => draft.transfermarket_link.is_some(),
            TargetField::DirectorFeedback => draft.director_feedback.is_some(),
            TargetField::CheckType => draft.check_type.is_some(),
            TargetField::Outcome => draft.outcome.is_some(),
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for TargetField {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        TargetField::ALL
            .into_iter()
            .find(|field| field.column() == s.trim())
            .ok_or_else(|| ImportError::InvalidConfigValueError {
                field: "mapping.aliases".to_string(),
                value: s.to_string(),
                reason: format!(
                    "Unknown player field. Valid fields: {}",
                    TargetField::ALL.map(TargetField::column).join(", ")
                ),
            })
    }
}

/// 欄位標題 -> 標準欄位的對照表。同一欄位有多個標題時，先出現者優先。
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    entries: Vec<(String, TargetField)>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            entries: DEFAULT_MAPPING
                .iter()
                .map(|(label, field)| (label.to_string(), *field))
                .collect(),
        }
    }
}

impl FieldMapping {
    pub fn with_alias(mut self, label: &str, field: TargetField) -> Self {
        self.entries.push((label.to_string(), field));
        self
    }

    /// 從設定檔的 `[mapping.aliases]` 加入額外標題 (依標題排序以保持結果穩定)
    pub fn with_aliases(mut self, aliases: &HashMap<String, String>) -> Result<Self> {
        let mut sorted: Vec<_> = aliases.iter().collect();
        sorted.sort();

        for (label, field) in sorted {
            let target = field.parse::<TargetField>()?;
            self = self.with_alias(label, target);
        }
        Ok(self)
    }

    pub fn entries(&self) -> &[(String, TargetField)] {
        &self.entries
    }
}

/// 依映射表將一列轉為部分球員資料。只省略，從不回傳錯誤。
#[derive(Debug, Clone, Default)]
pub struct FieldMapper {
    mapping: FieldMapping,
}

impl FieldMapper {
    pub fn new(mapping: FieldMapping) -> Self {
        Self { mapping }
    }

    pub fn map_row(&self, row: &ExternalRow) -> PlayerDraft {
        self.map_row_with_issues(row).0
    }

    /// 同 `map_row`，另外回報「有值但無法轉換」的欄位
    pub fn map_row_with_issues(&self, row: &ExternalRow) -> (PlayerDraft, Vec<FieldIssue>) {
        let mut draft = PlayerDraft::default();
        let mut issues = Vec::new();

        for (label, field) in self.mapping.entries() {
            let Some(cell) = row.get(label) else {
                continue;
            };
            if cell.is_blank() || field.is_set(&draft) {
                continue;
            }

            let invalid = |reason: &str| FieldIssue {
                row_number: row.row_number,
                column: label.clone(),
                raw_value: cell.to_text().unwrap_or_default(),
                reason: reason.to_string(),
            };

            match field.kind() {
                FieldKind::Text => {
                    if let (Some(slot), Some(text)) = (field.text_slot(&mut draft), cell.to_text()) {
                        *slot = Some(text);
                    }
                }
                FieldKind::Integer => match (field.integer_slot(&mut draft), parse_integer(cell)) {
                    (Some(slot), Some(value)) => *slot = Some(value),
                    _ => issues.push(invalid("not an integer")),
                },
                FieldKind::Foot => match cell.to_text().as_deref().and_then(normalize_foot) {
                    Some(foot) => draft.preferred_foot = Some(foot),
                    None => issues.push(invalid("unrecognized preferred foot")),
                },
            }
        }

        (draft, issues)
    }
}

pub fn normalize_foot(raw: &str) -> Option<PreferredFoot> {
    PreferredFoot::from_label(raw)
}

/// 數字儲存格取整數部分；文字取開頭的整數 ("1999" -> 1999, "4.5" -> 4, "abc" -> None)
pub fn parse_integer(cell: &CellValue) -> Option<i32> {
    match cell {
        CellValue::Number(n) if n.is_finite() => {
            let truncated = n.trunc();
            if truncated >= i32::MIN as f64 && truncated <= i32::MAX as f64 {
                Some(truncated as i32)
            } else {
                None
            }
        }
        CellValue::Text(text) => parse_leading_integer(text),
        _ => None,
    }
}

fn parse_leading_integer(text: &str) -> Option<i32> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ExternalRow {
        ExternalRow::new(2)
    }

    #[test]
    fn test_preferred_foot_equivalence_classes() {
        let mapper = FieldMapper::default();

        for (input, expected) in [
            ("Dx", PreferredFoot::Destro),
            ("Destro", PreferredFoot::Destro),
            ("Sx", PreferredFoot::Sinistro),
            ("Sinistro", PreferredFoot::Sinistro),
            ("Entrambi", PreferredFoot::Ambidestro),
            ("Ambidestro", PreferredFoot::Ambidestro),
        ] {
            let draft = mapper.map_row(&row().with_cell("Piede", input));
            assert_eq!(draft.preferred_foot, Some(expected), "input {:?}", input);

            // 已正規化的值再映射一次結果不變
            let again = mapper.map_row(&row().with_cell("Piede", expected.as_str()));
            assert_eq!(again.preferred_foot, Some(expected));
        }
    }

    #[test]
    fn test_unrecognized_foot_is_absent() {
        let mapper = FieldMapper::default();

        let draft = mapper.map_row(&row().with_cell("Piede", "Mancino"));
        assert_eq!(draft, PlayerDraft::default());

        let (_, issues) = mapper.map_row_with_issues(&row().with_cell("Piede", "Mancino"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].column, "Piede");
        assert_eq!(issues[0].raw_value, "Mancino");
    }

    #[test]
    fn test_foot_matching_is_case_sensitive() {
        assert_eq!(normalize_foot("dx"), None);
        assert_eq!(normalize_foot(" Sx "), Some(PreferredFoot::Sinistro));
    }

    #[test]
    fn test_integer_fields() {
        let mapper = FieldMapper::default();
        let input = row()
            .with_cell("Anno", "2003")
            .with_cell("Valore Potenziale ", 4.0)
            .with_cell("Valore Attuale  Dati", "tre")
            .with_cell("Valore Potenziale Dati", "3.5")
            .with_cell("Valutazione Atletica", CellValue::Empty);

        let (draft, issues) = mapper.map_row_with_issues(&input);

        assert_eq!(draft.birth_year, Some(2003));
        assert_eq!(draft.potential_value, Some(4));
        assert_eq!(draft.current_value, None);
        assert_eq!(draft.data_potential_value, Some(3));
        assert_eq!(draft.athletic_evaluation, None);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].column, "Valore Attuale  Dati");
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer(&CellValue::from("1999")), Some(1999));
        assert_eq!(parse_integer(&CellValue::from(" -12 ")), Some(-12));
        assert_eq!(parse_integer(&CellValue::from("12abc")), Some(12));
        assert_eq!(parse_integer(&CellValue::from("abc")), None);
        assert_eq!(parse_integer(&CellValue::from("")), None);
        assert_eq!(parse_integer(&CellValue::from("99999999999")), None);
        assert_eq!(parse_integer(&CellValue::Number(2001.9)), Some(2001));
        assert_eq!(parse_integer(&CellValue::Number(f64::NAN)), None);
        assert_eq!(parse_integer(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_text_fields_are_trimmed_and_numbers_rendered_plainly() {
        let mapper = FieldMapper::default();
        let input = row()
            .with_cell("Nome", "  Mario Rossi ")
            .with_cell("Squadra", 1909.0)
            .with_cell("Note ", "   ")
            .with_cell("Transfermarket", "https://www.transfermarkt.it/x/profil/spieler/123");

        let draft = mapper.map_row(&input);

        assert_eq!(draft.name.as_deref(), Some("Mario Rossi"));
        assert_eq!(draft.team.as_deref(), Some("1909"));
        assert_eq!(draft.notes, None);
        assert!(draft.transfermarket_link.is_some());
    }

    #[test]
    fn test_labels_must_match_exactly() {
        let mapper = FieldMapper::default();

        // 預設表的 "Note " 含尾端空白
        let draft = mapper.map_row(&row().with_cell("Note", "buon piede"));
        assert_eq!(draft.notes, None);

        let draft = mapper.map_row(&row().with_cell("Note ", "buon piede"));
        assert_eq!(draft.notes.as_deref(), Some("buon piede"));
    }

    #[test]
    fn test_aliases_extend_mapping_without_overriding() {
        let mut aliases = HashMap::new();
        aliases.insert("Nome Giocatore".to_string(), "name".to_string());
        let mapping = FieldMapping::default().with_aliases(&aliases).unwrap();
        let mapper = FieldMapper::new(mapping);

        let draft = mapper.map_row(&row().with_cell("Nome Giocatore", "Luca Bianchi"));
        assert_eq!(draft.name.as_deref(), Some("Luca Bianchi"));

        let both = row()
            .with_cell("Nome", "Primo")
            .with_cell("Nome Giocatore", "Secondo");
        assert_eq!(mapper.map_row(&both).name.as_deref(), Some("Primo"));
    }

    #[test]
    fn test_unknown_alias_target_is_rejected() {
        let mut aliases = HashMap::new();
        aliases.insert("Altezza".to_string(), "height".to_string());
        assert!(FieldMapping::default().with_aliases(&aliases).is_err());
    }
}
