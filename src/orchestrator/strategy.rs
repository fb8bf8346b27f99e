//! 查询策略
//!
//! 每种查询类型对应一个策略对象：字段绑定、交互脚本、分类方式、输出列。
//! 编排器本身与类型无关，只按策略执行。

use std::time::Duration;

use crate::browser::Locator;
use crate::config::FormUrls;
use crate::error::AppError;
use crate::ingest::ColumnBindings;
use crate::models::{FieldRole, LookupFamily, LookupKind};
use crate::services::{
    FailurePlaceholder, Marker, Normalization, OutcomeClassifier, OutputColumns,
    RESULT_COLUMN_RENAMES,
};
use crate::workflow::{ClassificationMode, FormInput, InteractionScript, LookupFlow};

/// 密码找回成功时的用户 ID 格式
const USER_ID_PATTERN: &str = r"^[A-Z]{10}$";

/// 一种查询类型的完整描述
#[derive(Debug, Clone)]
pub struct LookupStrategy {
    pub kind: LookupKind,
    pub flow: LookupFlow,
    /// docx 输入时固定使用的列名
    pub document_columns: Vec<(FieldRole, &'static str)>,
    /// 客户端未指定时使用的列名
    pub default_columns: Vec<(FieldRole, &'static str)>,
    pub output: OutputColumns,
}

impl LookupStrategy {
    pub fn for_kind(kind: LookupKind, form_urls: &FormUrls) -> Result<Self, AppError> {
        let form_url = form_urls.for_kind(kind);
        let strategy = match kind.family() {
            LookupFamily::UserId => Self::user_id(kind, form_url),
            LookupFamily::PassRecover => Self::pass_recover(kind, form_url)?,
            LookupFamily::ExamResult => Self::exam_result(kind, form_url),
        };
        Ok(strategy)
    }

    pub fn required_roles(&self) -> Vec<FieldRole> {
        self.flow.required_roles()
    }

    /// 关键字段所在的列
    pub fn key_column<'a>(&self, bindings: &'a ColumnBindings) -> Option<&'a str> {
        bindings.get(self.flow.key_role())
    }

    /// 补上默认列绑定
    pub fn resolve_bindings(&self, requested: ColumnBindings) -> ColumnBindings {
        self.default_columns
            .iter()
            .fold(requested, |b, (role, column)| b.or_default(*role, column))
    }

    fn user_id(kind: LookupKind, form_url: &str) -> Self {
        let script = InteractionScript {
            ready: Locator::Id("sname"),
            ready_timeout: Duration::from_secs(10),
            inputs: vec![
                FormInput {
                    role: FieldRole::Name,
                    locator: Locator::Id("sname"),
                    normalization: Normalization::AsIs,
                    label: "Name",
                },
                FormInput {
                    role: FieldRole::Father,
                    locator: Locator::Id("sfather"),
                    normalization: Normalization::AsIs,
                    label: "Father's Name",
                },
                FormInput {
                    role: FieldRole::Mobile,
                    locator: Locator::Id("smobile"),
                    normalization: Normalization::Phone,
                    label: "Mobile Number",
                },
            ],
            submit: Locator::Id("button01"),
            result: Locator::Class("red12bold"),
            result_timeout: Duration::from_secs(10),
        };
        let mode = ClassificationMode::Single {
            classifier: OutcomeClassifier::new(&[Marker::not_found("sorry, user id not found")]),
            failure: FailurePlaceholder::Describe("Failed: "),
        };

        Self {
            kind,
            flow: LookupFlow::new(form_url, FieldRole::Mobile, script, mode),
            document_columns: vec![
                (FieldRole::Name, "Name"),
                (FieldRole::Father, "Father's Name"),
                (FieldRole::Mobile, "Mobile Number"),
            ],
            default_columns: Vec::new(),
            output: OutputColumns::Single {
                result: format!("{} User ID", kind.program()),
                status: None,
            },
        }
    }

    fn pass_recover(kind: LookupKind, form_url: &str) -> Result<Self, AppError> {
        let script = InteractionScript {
            ready: Locator::Id("inv"),
            ready_timeout: Duration::from_secs(5),
            inputs: vec![
                FormInput {
                    role: FieldRole::UserId,
                    locator: Locator::Id("inv"),
                    normalization: Normalization::AsIs,
                    label: "User ID",
                },
                FormInput {
                    role: FieldRole::Mobile,
                    locator: Locator::Id("smobile"),
                    normalization: Normalization::Phone,
                    label: "Mobile Number",
                },
            ],
            submit: Locator::Id("button01"),
            result: Locator::XPath("(//span[@class='red12bold'])[2]"),
            result_timeout: Duration::from_secs(8),
        };
        let classifier = OutcomeClassifier::new(&[
            Marker::not_found("sorry"),
            Marker::error("fail"),
            Marker::error("error"),
        ])
        .with_positive_pattern(USER_ID_PATTERN)
        .map_err(|e| AppError::Config(format!("用户 ID 格式无效: {}", e)))?;
        let mode = ClassificationMode::Single {
            classifier,
            failure: FailurePlaceholder::Fixed("Sorry, User ID not found!!"),
        };

        Ok(Self {
            kind,
            flow: LookupFlow::new(form_url, FieldRole::UserId, script, mode),
            document_columns: vec![
                (FieldRole::UserId, "USER_ID"),
                (FieldRole::Mobile, "Mobile Number"),
            ],
            default_columns: Vec::new(),
            output: OutputColumns::Single {
                result: "Result".to_string(),
                status: Some("Status"),
            },
        })
    }

    fn exam_result(kind: LookupKind, form_url: &str) -> Self {
        let roll_column = match kind {
            LookupKind::BdsResult => "BDS_Roll",
            _ => "MBBS_Roll",
        };
        let script = InteractionScript {
            ready: Locator::Id("roll2"),
            ready_timeout: Duration::from_secs(10),
            inputs: vec![FormInput {
                role: FieldRole::Roll,
                locator: Locator::Id("roll2"),
                normalization: Normalization::Trim,
                label: roll_column,
            }],
            submit: Locator::Class("search_btn"),
            result: Locator::Class("stones"),
            result_timeout: Duration::from_secs(10),
        };

        Self {
            kind,
            flow: LookupFlow::new(form_url, FieldRole::Roll, script, ClassificationMode::Multi),
            document_columns: vec![(FieldRole::Roll, roll_column)],
            default_columns: vec![(FieldRole::Roll, roll_column)],
            output: OutputColumns::Multi {
                prefix: "Result_",
                renames: Some(&RESULT_COLUMN_RENAMES),
            },
        }
    }
}
