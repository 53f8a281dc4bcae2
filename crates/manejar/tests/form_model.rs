//! End-to-end coverage for derived form models.

use std::sync::Arc;

use manejar::{
    Contract, ContractSpec, FormField, FormModel, LocatorTemplate, OperationSpec, PageFactory,
    PanelLike, ParamType, PerformedAction, ScriptedSession,
};

#[derive(FormModel)]
struct Registration {
    username: String,
    #[manejar(rename = "pass")]
    password: String,
    age: u32,
    #[manejar(skip)]
    accepted_terms: bool,
}

struct RegistrationForm;

impl Contract for RegistrationForm {
    fn display_name() -> &'static str {
        "RegistrationForm"
    }

    fn describe() -> ContractSpec {
        ContractSpec::panel("RegistrationForm").with_operation(
            OperationSpec::new("setRegistration")
                .with_param(ParamType::Model)
                .with_locator(LocatorTemplate::id("register-"))
                .returns_self(),
        )
    }
}
impl PanelLike for RegistrationForm {}

fn model() -> Registration {
    Registration {
        username: "jason".to_string(),
        password: "hunter2".to_string(),
        age: 44,
        accepted_terms: true,
    }
}

#[test]
fn derived_fields_keep_declaration_order_with_rename_and_skip() {
    let fields = model().fields();
    assert_eq!(
        fields,
        vec![
            FormField::new("username", "jason"),
            FormField::new("pass", "hunter2"),
            FormField::new("age", "44"),
        ]
    );
}

#[test]
fn derived_model_drives_one_set_per_field() {
    let session = Arc::new(ScriptedSession::new());
    let factory = PageFactory::new(Arc::clone(&session) as Arc<dyn manejar::DriverSession>);
    let form = factory.create::<RegistrationForm>().unwrap();

    form.set_model("setRegistration", &model()).unwrap();

    assert_eq!(
        session.actions(),
        vec![
            PerformedAction::SetText {
                locator: "id(register-username)".to_string(),
                value: "jason".to_string(),
            },
            PerformedAction::SetText {
                locator: "id(register-pass)".to_string(),
                value: "hunter2".to_string(),
            },
            PerformedAction::SetText {
                locator: "id(register-age)".to_string(),
                value: "44".to_string(),
            },
        ]
    );
}
