//! 条码识别模块
//!
//! # 设计思路
//!
//! 扫码枪或剪贴板得到的只是一段文本，本模块负责判断它是哪一类标识符：
//! ISBN-10 / ISBN-13 / ISSN / EAN-13，或者只是无法识别的数字、普通文本。
//! 识别结果使用带标签的枚举 `IdentifierClassification` 显式表达，
//! 上层按变体穷尽匹配，而不是根据哪个后端调用成功来推断类型。
//!
//! # 实现思路
//!
//! - 纯函数、无状态：同一输入永远得到同一结果，可在任意上下文重复调用。
//! - ISBN-10 只接受“去掉连字符与空白后为 9 位数字 + 数字或 X”的紧凑形式，
//!   其他字母会使 ISBN-10 规则失效；其余长度规则只看过滤后的数字。
//! - 13 位且校验通过的数字无法区分 ISBN-13 与 EAN-13，
//!   由调用方通过 `ScanContext` 决定按哪种含义解读。
//! - ISSN 规则在历史版本中不一致（恰好 8 位 / 8 位以上且非 10、13 位），
//!   通过 `IssnPolicy` 显式选择，默认严格。
//! - 形状匹配沿用 `once_cell::sync::Lazy` 预编译正则，首次调用后零成本复用。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// ISBN-10 紧凑形式：9 位数字 + 数字或校验字符 X
static ISBN10_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{9}[0-9Xx]$").unwrap());

/// 以 X 结尾的 ISSN 紧凑形式：7 位数字 + X
static ISSN_X_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{7}[Xx]$").unwrap());

/// 13 位码的解读方式
///
/// ISBN-13 与 EAN-13 的校验算法完全一致，仅凭数字无法区分。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanContext {
    /// 图书路径：校验通过的 13 位码视为 ISBN-13
    #[default]
    Isbn,
    /// 商品码路径：校验通过的 13 位码视为 EAN-13
    Ean,
    /// 按 Bookland 前缀区分：978 / 979 开头为 ISBN-13，其余为 EAN-13
    Bookland,
}

impl ScanContext {
    fn resolve_thirteen(self, digits: &str) -> IdentifierKind {
        match self {
            ScanContext::Isbn => IdentifierKind::Isbn13,
            ScanContext::Ean => IdentifierKind::Ean13,
            ScanContext::Bookland => {
                if digits.starts_with("978") || digits.starts_with("979") {
                    IdentifierKind::Isbn13
                } else {
                    IdentifierKind::Ean13
                }
            }
        }
    }
}

/// ISSN 候选判定策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssnPolicy {
    /// 恰好 8 位（7 位数字 + X 亦可）
    #[default]
    Strict,
    /// 严格规则之外，长度大于 8 且不为 10、13 的纯数字串也视为候选
    Permissive,
}

/// 标识符类别（不携带数据）
///
/// 字符串形式与后端 `book_identifiers.type` 列保持一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    #[serde(rename = "ISBN_10")]
    Isbn10,
    #[serde(rename = "ISBN_13")]
    Isbn13,
    #[serde(rename = "ISSN")]
    Issn,
    #[serde(rename = "EAN_13")]
    Ean13,
    #[serde(rename = "NUMERIC_UNRECOGNIZED")]
    NumericUnrecognized,
    #[serde(rename = "NOT_A_BARCODE")]
    NotABarcode,
}

impl IdentifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierKind::Isbn10 => "ISBN_10",
            IdentifierKind::Isbn13 => "ISBN_13",
            IdentifierKind::Issn => "ISSN",
            IdentifierKind::Ean13 => "EAN_13",
            IdentifierKind::NumericUnrecognized => "NUMERIC_UNRECOGNIZED",
            IdentifierKind::NotABarcode => "NOT_A_BARCODE",
        }
    }
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次识别的结果
///
/// 标识符变体携带规范化后的数字串（仅 ASCII 数字，校验字符 X 统一大写）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum IdentifierClassification {
    #[serde(rename = "ISBN_10")]
    Isbn10 { digits: String },
    #[serde(rename = "ISBN_13")]
    Isbn13 { digits: String },
    /// `checksum_valid` 仅在 8 位时有意义，宽松策略下的其他长度为 `None`
    #[serde(rename = "ISSN")]
    Issn {
        digits: String,
        checksum_valid: Option<bool>,
    },
    #[serde(rename = "EAN_13")]
    Ean13 { digits: String },
    #[serde(rename = "NUMERIC_UNRECOGNIZED")]
    NumericUnrecognized { digits: String },
    #[serde(rename = "NOT_A_BARCODE")]
    NotABarcode,
}

impl IdentifierClassification {
    pub fn kind(&self) -> IdentifierKind {
        match self {
            IdentifierClassification::Isbn10 { .. } => IdentifierKind::Isbn10,
            IdentifierClassification::Isbn13 { .. } => IdentifierKind::Isbn13,
            IdentifierClassification::Issn { .. } => IdentifierKind::Issn,
            IdentifierClassification::Ean13 { .. } => IdentifierKind::Ean13,
            IdentifierClassification::NumericUnrecognized { .. } => {
                IdentifierKind::NumericUnrecognized
            }
            IdentifierClassification::NotABarcode => IdentifierKind::NotABarcode,
        }
    }

    /// 规范化后的数字串；`NotABarcode` 没有
    pub fn digits(&self) -> Option<&str> {
        match self {
            IdentifierClassification::Isbn10 { digits }
            | IdentifierClassification::Isbn13 { digits }
            | IdentifierClassification::Issn { digits, .. }
            | IdentifierClassification::Ean13 { digits }
            | IdentifierClassification::NumericUnrecognized { digits } => Some(digits),
            IdentifierClassification::NotABarcode => None,
        }
    }

    /// 是否为可交给后端处理的标识符
    pub fn is_identifier(&self) -> bool {
        matches!(
            self,
            IdentifierClassification::Isbn10 { .. }
                | IdentifierClassification::Isbn13 { .. }
                | IdentifierClassification::Issn { .. }
                | IdentifierClassification::Ean13 { .. }
        )
    }
}

/// 识别器：携带 13 位码解读方式与 ISSN 策略
///
/// # 示例
/// ```rust
/// use scan_catalog::identifier::{Classifier, IdentifierKind, IssnPolicy, ScanContext};
///
/// let classifier = Classifier::new(ScanContext::Ean, IssnPolicy::Strict);
/// assert_eq!(classifier.classify("4006381333931").kind(), IdentifierKind::Ean13);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classifier {
    pub context: ScanContext,
    pub issn_policy: IssnPolicy,
}

impl Classifier {
    pub const fn new(context: ScanContext, issn_policy: IssnPolicy) -> Self {
        Self {
            context,
            issn_policy,
        }
    }

    /// 识别一段已去除首尾空白的文本
    ///
    /// 永不失败，最差结果为 `NotABarcode`。
    pub fn classify(&self, text: &str) -> IdentifierClassification {
        let compact: String = text
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect();
        let digits: String = text.chars().filter(char::is_ascii_digit).collect();

        if ISBN10_SHAPE.is_match(&compact) && isbn10_is_valid(&compact) {
            return IdentifierClassification::Isbn10 {
                digits: compact.to_ascii_uppercase(),
            };
        }

        if digits.len() == 13 && isbn13_is_valid(&digits) {
            return match self.context.resolve_thirteen(&digits) {
                IdentifierKind::Ean13 => IdentifierClassification::Ean13 { digits },
                _ => IdentifierClassification::Isbn13 { digits },
            };
        }

        if ISSN_X_SHAPE.is_match(&compact) || digits.len() == 8 {
            let digits = if digits.len() == 8 {
                digits
            } else {
                compact.to_ascii_uppercase()
            };
            let checksum_valid = Some(issn_is_valid(&digits));
            return IdentifierClassification::Issn {
                digits,
                checksum_valid,
            };
        }

        if self.issn_policy == IssnPolicy::Permissive
            && digits.len() > 8
            && digits.len() != 10
            && digits.len() != 13
        {
            return IdentifierClassification::Issn {
                digits,
                checksum_valid: None,
            };
        }

        // 连字符只作分隔符；中间夹空白的不算纯数字
        let unhyphenated: String = text.chars().filter(|c| *c != '-').collect();
        if !unhyphenated.is_empty() && unhyphenated.chars().all(|c| c.is_ascii_digit()) {
            return IdentifierClassification::NumericUnrecognized {
                digits: unhyphenated,
            };
        }

        IdentifierClassification::NotABarcode
    }
}

/// 使用默认识别器（图书路径 + 严格 ISSN）识别文本
pub fn classify(text: &str) -> IdentifierClassification {
    Classifier::default().classify(text)
}

/// 校验 10 位 ISBN（最后一位可为 X）
///
/// 权重从 10 递减到 1，X 记为 10，加权和能被 11 整除即有效。
pub fn isbn10_is_valid(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() != 10 {
        return false;
    }

    let mut sum: u32 = 0;
    for (i, b) in bytes.iter().enumerate() {
        let value = match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'X' | b'x' if i == 9 => 10,
            _ => return false,
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

/// 根据前 12 位计算 EAN-13 / ISBN-13 校验位
///
/// 输入不是 12 位数字时返回 `None`。
pub fn ean13_check_digit(first_twelve: &str) -> Option<u8> {
    let bytes = first_twelve.as_bytes();
    if bytes.len() != 12 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let sum: u32 = bytes
        .iter()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    Some(((10 - sum % 10) % 10) as u8)
}

/// 校验 13 位 ISBN
pub fn isbn13_is_valid(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() != 13 || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }
    ean13_check_digit(&candidate[..12]) == Some(bytes[12] - b'0')
}

/// 校验 EAN-13，与 ISBN-13 算法相同
pub fn ean13_is_valid(candidate: &str) -> bool {
    isbn13_is_valid(candidate)
}

/// 根据前 7 位计算 ISSN 校验字符
///
/// 权重从 8 递减到 2，`(11 - sum % 11) % 11`，10 记为 `X`。
pub fn issn_check_char(first_seven: &str) -> Option<char> {
    let bytes = first_seven.as_bytes();
    if bytes.len() != 7 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let sum: u32 = bytes
        .iter()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * (8 - i as u32))
        .sum();
    match (11 - sum % 11) % 11 {
        10 => Some('X'),
        d => char::from_digit(d, 10),
    }
}

/// 校验 8 位 ISSN（最后一位可为 X）
pub fn issn_is_valid(candidate: &str) -> bool {
    if candidate.len() != 8 || !candidate.is_ascii() {
        return false;
    }
    let (body, check) = candidate.split_at(7);
    match (issn_check_char(body), check.chars().next()) {
        (Some(expected), Some(actual)) => expected == actual.to_ascii_uppercase(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn10_with_hyphens_detected() {
        assert_eq!(
            classify("0-306-40615-2"),
            IdentifierClassification::Isbn10 {
                digits: "0306406152".to_string()
            }
        );
    }

    #[test]
    fn test_isbn10_lowercase_x_normalized() {
        assert_eq!(
            classify("0-8044-2957-x"),
            IdentifierClassification::Isbn10 {
                digits: "080442957X".to_string()
            }
        );
    }

    #[test]
    fn test_isbn10_bad_checksum_is_numeric() {
        assert_eq!(
            classify("0306406153").kind(),
            IdentifierKind::NumericUnrecognized
        );
    }

    #[test]
    fn test_letters_disqualify_isbn10_only() {
        assert_eq!(classify("ISBN 0306406152"), IdentifierClassification::NotABarcode);
        assert_eq!(
            classify("ISBN 978-0-306-40615-7").kind(),
            IdentifierKind::Isbn13
        );
    }

    #[test]
    fn test_thirteen_digits_follow_context() {
        let isbn = Classifier::new(ScanContext::Isbn, IssnPolicy::Strict);
        let ean = Classifier::new(ScanContext::Ean, IssnPolicy::Strict);
        let bookland = Classifier::new(ScanContext::Bookland, IssnPolicy::Strict);

        assert_eq!(isbn.classify("9780306406157").kind(), IdentifierKind::Isbn13);
        assert_eq!(ean.classify("9780306406157").kind(), IdentifierKind::Ean13);
        assert_eq!(bookland.classify("9780306406157").kind(), IdentifierKind::Isbn13);
        assert_eq!(bookland.classify("4006381333931").kind(), IdentifierKind::Ean13);
    }

    #[test]
    fn test_thirteen_digits_bad_checksum_is_numeric() {
        assert_eq!(
            classify("9780306406158"),
            IdentifierClassification::NumericUnrecognized {
                digits: "9780306406158".to_string()
            }
        );
    }

    #[test]
    fn test_issn_with_check_x() {
        assert_eq!(
            classify("2434-561X"),
            IdentifierClassification::Issn {
                digits: "2434561X".to_string(),
                checksum_valid: Some(true),
            }
        );
    }

    #[test]
    fn test_issn_reports_failed_checksum() {
        assert_eq!(
            classify("03178472"),
            IdentifierClassification::Issn {
                digits: "03178472".to_string(),
                checksum_valid: Some(false),
            }
        );
    }

    #[test]
    fn test_fourteen_digits_depend_on_policy() {
        let permissive = Classifier::new(ScanContext::Isbn, IssnPolicy::Permissive);
        assert_eq!(
            classify("12345678901234").kind(),
            IdentifierKind::NumericUnrecognized
        );
        assert_eq!(
            permissive.classify("12345678901234"),
            IdentifierClassification::Issn {
                digits: "12345678901234".to_string(),
                checksum_valid: None,
            }
        );
    }

    #[test]
    fn test_empty_and_text_are_not_barcodes() {
        assert_eq!(classify(""), IdentifierClassification::NotABarcode);
        assert_eq!(classify("abc"), IdentifierClassification::NotABarcode);
        assert_eq!(classify("hello 42"), IdentifierClassification::NotABarcode);
    }

    #[test]
    fn test_short_number_is_numeric_unrecognized() {
        assert_eq!(
            classify("12345"),
            IdentifierClassification::NumericUnrecognized {
                digits: "12345".to_string()
            }
        );
    }

    #[test]
    fn test_internal_whitespace_is_not_numeric() {
        assert_eq!(classify("123 456"), IdentifierClassification::NotABarcode);
        assert_eq!(
            classify("123-456"),
            IdentifierClassification::NumericUnrecognized {
                digits: "123456".to_string()
            }
        );
    }

    #[test]
    fn test_non_ascii_digits_ignored() {
        assert_eq!(classify("٣٣٣"), IdentifierClassification::NotABarcode);
    }

    #[test]
    fn test_check_helpers() {
        assert_eq!(ean13_check_digit("978030640615"), Some(7));
        assert_eq!(ean13_check_digit("97803064061"), None);
        assert_eq!(issn_check_char("0317847"), Some('1'));
        assert_eq!(issn_check_char("2434561"), Some('X'));
        assert!(issn_is_valid("2434561x"));
        assert!(ean13_is_valid("4006381333931"));
        assert!(!isbn10_is_valid("X306406152"));
    }

    #[test]
    fn test_kind_strings_match_backend() {
        assert_eq!(IdentifierKind::Isbn10.as_str(), "ISBN_10");
        assert_eq!(IdentifierKind::Ean13.to_string(), "EAN_13");
        let json = serde_json::to_value(classify("9780306406157")).unwrap();
        assert_eq!(json["kind"], "ISBN_13");
        assert_eq!(json["digits"], "9780306406157");
    }
}
