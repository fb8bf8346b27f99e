//! 单条记录查询流程 - 流程层
//!
//! 核心职责：定义"一条记录"的完整查询流程
//!
//! 流程顺序：
//! 1. 打开表单地址，等待表单就绪
//! 2. 按顺序填写输入框，点击提交
//! 3. 等待结果元素，提取文本
//! 4. 分类（单值）或保留片段（多值）；任何失败都转换为占位结果

use std::time::Duration;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::browser::{Locator, SessionClient};
use crate::error::SessionError;
use crate::ingest::ColumnBindings;
use crate::models::{FieldRole, LookupRequest, OutcomeKind, OutcomeValue, Record};
use crate::services::classifier::fragments_or_placeholder;
use crate::services::{FailurePlaceholder, Normalization, OutcomeClassifier};
use crate::utils::logging::{log_record_start, truncate_text};
use crate::workflow::lookup_ctx::RecordCtx;

/// 一个需要填写的输入框
#[derive(Debug, Clone)]
pub struct FormInput {
    pub role: FieldRole,
    pub locator: Locator,
    pub normalization: Normalization,
    /// 进度事件中回显该字段时使用的名称
    pub label: &'static str,
}

/// 表单交互脚本
#[derive(Debug, Clone)]
pub struct InteractionScript {
    /// 表单就绪的标志元素
    pub ready: Locator,
    pub ready_timeout: Duration,
    pub inputs: Vec<FormInput>,
    pub submit: Locator,
    /// 结果元素
    pub result: Locator,
    pub result_timeout: Duration,
}

/// 结果的解释方式
#[derive(Debug, Clone)]
pub enum ClassificationMode {
    /// 提取一个文本并分类
    Single {
        classifier: OutcomeClassifier,
        failure: FailurePlaceholder,
    },
    /// 提取全部匹配元素的文本，按位置保留
    Multi,
}

/// 单条记录查询流程
///
/// - 不持有会话，由调用方借出
/// - 不返回错误：交互失败被吸收为占位结果
#[derive(Debug, Clone)]
pub struct LookupFlow {
    form_url: String,
    key_role: FieldRole,
    script: InteractionScript,
    mode: ClassificationMode,
}

impl LookupFlow {
    pub fn new(
        form_url: impl Into<String>,
        key_role: FieldRole,
        script: InteractionScript,
        mode: ClassificationMode,
    ) -> Self {
        Self {
            form_url: form_url.into(),
            key_role,
            script,
            mode,
        }
    }

    pub fn key_role(&self) -> FieldRole {
        self.key_role
    }

    /// 是否为单值分类模式
    pub fn is_classified(&self) -> bool {
        matches!(self.mode, ClassificationMode::Single { .. })
    }

    /// 本流程需要的字段角色（按填写顺序，关键字段一定在内）
    pub fn required_roles(&self) -> Vec<FieldRole> {
        let mut roles: Vec<FieldRole> = self.script.inputs.iter().map(|i| i.role).collect();
        if !roles.contains(&self.key_role) {
            roles.push(self.key_role);
        }
        roles
    }

    /// 从记录构造查询输入
    ///
    /// 输入值按各自的规则规范化；关键字段只去除首尾空白，保证能和原表对上。
    pub fn build_request(&self, record: &Record, bindings: &ColumnBindings) -> LookupRequest {
        let raw = |role: FieldRole| {
            bindings
                .get(role)
                .and_then(|column| record.get(column))
                .unwrap_or("")
        };

        let values = self
            .script
            .inputs
            .iter()
            .map(|input| (input.role, input.normalization.apply(raw(input.role))))
            .collect();

        LookupRequest {
            key: raw(self.key_role).trim().to_string(),
            values,
        }
    }

    /// 进度事件中回显的输入字段
    pub fn echo(&self, request: &LookupRequest) -> IndexMap<String, String> {
        self.script
            .inputs
            .iter()
            .map(|input| (input.label.to_string(), request.value(input.role).to_string()))
            .collect()
    }

    /// 执行一次查询
    pub async fn run(
        &self,
        session: &mut dyn SessionClient,
        request: &LookupRequest,
        ctx: &RecordCtx,
    ) -> OutcomeValue {
        log_record_start(ctx, &request.key);
        let submitted = self.submit(session, request).await;

        match &self.mode {
            ClassificationMode::Single {
                classifier,
                failure,
            } => {
                let text = match submitted {
                    Ok(()) => session
                        .wait_for_text(self.script.result, self.script.result_timeout)
                        .await
                        .map(|t| t.trim().to_string()),
                    Err(e) => Err(e),
                };

                match text {
                    Ok(text) => {
                        let classification = classifier.classify(&text);
                        info!(
                            "{} ✓ {} → {} ({:?})",
                            ctx,
                            request.key,
                            truncate_text(&text, 40),
                            classification.kind
                        );
                        OutcomeValue::Classified {
                            text,
                            kind: classification.kind,
                        }
                    }
                    Err(e) => {
                        warn!("{} ⚠️ 查询失败: {}", ctx, e);
                        OutcomeValue::Classified {
                            text: failure.render(&e),
                            kind: OutcomeKind::Error,
                        }
                    }
                }
            }
            ClassificationMode::Multi => {
                let fragments = match submitted {
                    Ok(()) => {
                        session
                            .wait_for_all_text(self.script.result, self.script.result_timeout)
                            .await
                    }
                    Err(e) => Err(e),
                };

                match &fragments {
                    Ok(values) => info!("{} ✓ {} → {} 项", ctx, request.key, values.len()),
                    Err(e) => warn!("{} ⚠️ 查询失败: {}", ctx, e),
                }
                OutcomeValue::Fragments(fragments_or_placeholder(fragments))
            }
        }
    }

    /// 没有可用会话时的占位结果
    pub fn placeholder(&self, error: &SessionError) -> OutcomeValue {
        match &self.mode {
            ClassificationMode::Single { failure, .. } => OutcomeValue::Classified {
                text: failure.render(error),
                kind: OutcomeKind::Error,
            },
            ClassificationMode::Multi => {
                OutcomeValue::Fragments(fragments_or_placeholder(Err(error.clone())))
            }
        }
    }

    /// 导航 → 等待就绪 → 填写 → 提交
    async fn submit(
        &self,
        session: &mut dyn SessionClient,
        request: &LookupRequest,
    ) -> Result<(), SessionError> {
        session.navigate(&self.form_url).await?;
        session
            .wait_for_text(self.script.ready, self.script.ready_timeout)
            .await?;

        for input in &self.script.inputs {
            session
                .fill(input.locator, request.value(input.role))
                .await?;
        }

        session.activate(self.script.submit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SessionFactory;
    use crate::models::LookupKind;
    use crate::services::Marker;
    use crate::testing::{RecordedCall, Scripted, ScriptedSessionFactory};

    const RESULT: Locator = Locator::Class("red12bold");

    fn user_id_flow() -> LookupFlow {
        LookupFlow::new(
            "http://form.test/getinvoice.php",
            FieldRole::Mobile,
            InteractionScript {
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
                        role: FieldRole::Mobile,
                        locator: Locator::Id("smobile"),
                        normalization: Normalization::Phone,
                        label: "Mobile Number",
                    },
                ],
                submit: Locator::Id("button01"),
                result: RESULT,
                result_timeout: Duration::from_secs(10),
            },
            ClassificationMode::Single {
                classifier: OutcomeClassifier::new(&[Marker::not_found("sorry, user id not found")]),
                failure: FailurePlaceholder::Describe("Failed: "),
            },
        )
    }

    fn record() -> (Record, ColumnBindings) {
        let mut fields = IndexMap::new();
        fields.insert("Student".to_string(), "Ayesha".to_string());
        fields.insert("Phone".to_string(), " 1712345678 ".to_string());
        let bindings = ColumnBindings::new()
            .with(FieldRole::Name, "Student")
            .with(FieldRole::Mobile, "Phone");
        (Record::new(0, fields), bindings)
    }

    #[test]
    fn test_request_normalizes_inputs_but_not_key() {
        let flow = user_id_flow();
        let (record, bindings) = record();
        let request = flow.build_request(&record, &bindings);

        assert_eq!(request.value(FieldRole::Mobile), "01712345678");
        assert_eq!(request.key, "1712345678");
        assert_eq!(
            flow.echo(&request).get("Mobile Number").map(String::as_str),
            Some("01712345678")
        );
    }

    #[tokio::test]
    async fn test_run_drives_form_in_order() {
        let factory = ScriptedSessionFactory::new().respond(RESULT, [Scripted::text(" MB24001234 ")]);
        let mut session = factory.open().await.unwrap();
        let flow = user_id_flow();
        let (record, bindings) = record();
        let request = flow.build_request(&record, &bindings);
        let ctx = RecordCtx::new(LookupKind::MbbsUserId, 1, 1);

        let value = flow.run(session.as_mut(), &request, &ctx).await;

        assert_eq!(
            value,
            OutcomeValue::Classified {
                text: "MB24001234".into(),
                kind: OutcomeKind::Found
            }
        );
        assert_eq!(
            factory.calls(),
            vec![
                RecordedCall::Navigate("http://form.test/getinvoice.php".into()),
                RecordedCall::WaitText(Locator::Id("sname")),
                RecordedCall::Fill(Locator::Id("sname"), "Ayesha".into()),
                RecordedCall::Fill(Locator::Id("smobile"), "01712345678".into()),
                RecordedCall::Activate(Locator::Id("button01")),
                RecordedCall::WaitText(RESULT),
            ]
        );
    }

    #[tokio::test]
    async fn test_timeout_becomes_placeholder() {
        let factory = ScriptedSessionFactory::new().respond(RESULT, [Scripted::timeout(RESULT)]);
        let mut session = factory.open().await.unwrap();
        let flow = user_id_flow();
        let (record, bindings) = record();
        let request = flow.build_request(&record, &bindings);
        let ctx = RecordCtx::new(LookupKind::MbbsUserId, 1, 1);

        match flow.run(session.as_mut(), &request, &ctx).await {
            OutcomeValue::Classified { text, kind } => {
                assert_eq!(kind, OutcomeKind::Error);
                assert!(text.starts_with("Failed: "));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
