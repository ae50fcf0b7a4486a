//! Integration tests for model analysis
//!
//! Models are built in code and run through the analyser; the assertions
//! cover classification, issues and equation ordering.

use cellgen::analyser::{
    Analyser, DeclaredVariable, EquationKind, IssueKind, Level, MathFunction, ModelType,
    VariableType,
};
use cellgen::json::{Component, Connection, JsonModel, Variable};
use cellgen::analyse_all;

fn math(body: &str) -> String {
    format!(
        "<math xmlns=\"http://www.w3.org/1998/Math/MathML\">{}</math>",
        body
    )
}

fn ode(variable: &str, voi: &str, rhs: &str) -> String {
    format!(
        "<apply><eq/><apply><diff/><bvar><ci>{}</ci></bvar><ci>{}</ci></apply>{}</apply>",
        voi, variable, rhs
    )
}

fn assign(variable: &str, rhs: &str) -> String {
    format!("<apply><eq/><ci>{}</ci>{}</apply>", variable, rhs)
}

fn single(component: Component) -> JsonModel {
    let mut model = JsonModel::new("test");
    model.components.push(component);
    model
}

// ═══════════════════════════════════════════════════════════════════════════════
// Classification
// ═══════════════════════════════════════════════════════════════════════════════

mod classification {
    use super::*;

    #[test]
    fn test_decay_is_ode() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(1.0))
                .with_variable(Variable::new("k", "dimensionless").with_initial_value(0.5))
                .with_math(math(&ode(
                    "x",
                    "t",
                    "<apply><times/><apply><minus/><ci>k</ci></apply><ci>x</ci></apply>",
                ))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Ode);
        assert_eq!(analysed.issue_count(), 0);

        let voi = analysed.voi().expect("ODE models have a variable of integration");
        assert_eq!(voi.kind, VariableType::VariableOfIntegration);
        assert_eq!(voi.variable.name, "t");

        assert_eq!(analysed.state_count(), 1);
        assert_eq!(analysed.states()[0].variable.name, "x");
        assert_eq!(analysed.states()[0].index, 0);

        assert_eq!(analysed.variable_count(), 1);
        assert_eq!(analysed.variables()[0].kind, VariableType::Constant);
        assert_eq!(analysed.variables()[0].variable.name, "k");

        assert_eq!(analysed.equations().len(), 1);
        assert_eq!(analysed.equations()[0].kind(), EquationKind::Rate);
        assert_eq!(analysed.equations()[0].variable().variable.name, "x");
    }

    #[test]
    fn test_algebraic_model_has_no_voi() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("a", "dimensionless").with_initial_value(2.0))
                .with_variable(Variable::new("b", "dimensionless"))
                .with_variable(Variable::new("c", "dimensionless"))
                .with_math(math(&format!(
                    "{}{}",
                    assign("b", "<apply><times/><cn>3</cn><ci>a</ci></apply>"),
                    assign("c", "<cn>4</cn>"),
                ))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Algebraic);
        assert!(analysed.voi().is_none());
        assert_eq!(analysed.state_count(), 0);

        let kinds: Vec<VariableType> = analysed.variables().iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VariableType::Constant,
                VariableType::ComputedConstant,
                VariableType::ComputedConstant
            ]
        );
        for (position, variable) in analysed.variables().iter().enumerate() {
            assert_eq!(variable.index, position);
        }

        let kinds: Vec<EquationKind> = analysed.equations().iter().map(|e| e.kind()).collect();
        assert!(kinds.contains(&EquationKind::TrueConstant));
        assert!(kinds.contains(&EquationKind::VariableBasedConstant));
    }

    #[test]
    fn test_state_dependent_algebraic_equation() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(1.0))
                .with_variable(Variable::new("y", "dimensionless"))
                .with_math(math(&format!(
                    "{}{}",
                    assign("y", "<apply><times/><cn>2</cn><ci>x</ci></apply>"),
                    ode("x", "t", "<ci>y</ci>"),
                ))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Ode);

        let equations = analysed.equations();
        assert_eq!(equations.len(), 2);

        // States sort before algebraic variables
        assert_eq!(equations[0].kind(), EquationKind::Rate);
        assert_eq!(equations[1].kind(), EquationKind::Algebraic);
        assert!(equations[1].is_state_rate_based());
        assert_eq!(equations[0].dependencies(), &[1]);
        assert!(equations[1].dependencies().is_empty());
    }

    #[test]
    fn test_constant_initial_value_reference() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value("x0"))
                .with_variable(Variable::new("x0", "dimensionless").with_initial_value(3.0))
                .with_math(math(&ode("x", "t", "<cn>1</cn>"))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Ode);
        assert_eq!(analysed.variables()[0].variable.name, "x0");
        assert_eq!(analysed.variables()[0].kind, VariableType::Constant);
    }

    #[test]
    fn test_empty_model_is_unknown() {
        let analysed = Analyser::new().analyse(&JsonModel::new("empty"));
        assert_eq!(analysed.model_type(), ModelType::Unknown);
        assert_eq!(analysed.issue_count(), 0);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constraint Issues
// ═══════════════════════════════════════════════════════════════════════════════

mod constraints {
    use super::*;

    #[test]
    fn test_computed_twice_is_overconstrained() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("x", "dimensionless"))
                .with_math(math(&format!(
                    "{}{}",
                    assign("x", "<cn>1</cn>"),
                    assign("x", "<cn>2</cn>"),
                ))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Overconstrained);
        assert_eq!(analysed.issue_count(), 1);
        assert_eq!(analysed.issues()[0].kind, IssueKind::ComputedMoreThanOnce);
        assert!(analysed.variables().is_empty());
        assert!(analysed.equations().is_empty());
    }

    #[test]
    fn test_cycle_is_underconstrained() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("a", "dimensionless"))
                .with_variable(Variable::new("b", "dimensionless"))
                .with_math(math(&format!(
                    "{}{}",
                    assign("a", "<apply><plus/><ci>b</ci><cn>1</cn></apply>"),
                    assign("b", "<apply><minus/><ci>a</ci><cn>1</cn></apply>"),
                ))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Underconstrained);
        assert_eq!(analysed.issue_count(), 2);
        assert!(analysed
            .issues()
            .iter()
            .all(|issue| issue.kind == IssueKind::NotComputed && issue.level == Level::Error));
    }

    #[test]
    fn test_uninitialised_state() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless"))
                .with_math(math(&ode("x", "t", "<cn>1</cn>"))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Underconstrained);
        assert_eq!(analysed.issues()[0].kind, IssueKind::StateNotInitialised);
        let variable = analysed.issues()[0].variable.as_ref().unwrap();
        assert_eq!(variable.variable, "x");
        assert_eq!(
            analysed.issues()[0].description,
            "Variable 'x' in component 'main' is used in an ODE, but it is not initialised."
        );
    }

    #[test]
    fn test_both_problems_are_unsuitably_constrained() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("x", "dimensionless"))
                .with_variable(Variable::new("y", "dimensionless"))
                .with_variable(Variable::new("z", "dimensionless"))
                .with_math(math(&format!(
                    "{}{}{}",
                    assign("x", "<cn>1</cn>"),
                    assign("x", "<cn>2</cn>"),
                    assign("y", "<apply><plus/><ci>z</ci><cn>1</cn></apply>"),
                ))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::UnsuitablyConstrained);
        let kinds: Vec<IssueKind> = analysed.issues().iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::ComputedMoreThanOnce));
        assert!(kinds.contains(&IssueKind::NotComputed));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Structural Issues
// ═══════════════════════════════════════════════════════════════════════════════

mod structure {
    use super::*;

    #[test]
    fn test_undefined_variable() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("x", "dimensionless"))
                .with_math(math(&assign("x", "<ci>nowhere</ci>"))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Invalid);
        assert_eq!(analysed.issues()[0].kind, IssueKind::UndefinedVariable);
        assert_eq!(
            analysed.issues()[0].to_string(),
            "Variable 'nowhere' in component 'main' is referenced in an equation, but it is not defined anywhere."
        );
    }

    #[test]
    fn test_second_order_derivative() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(0.0))
                .with_math(math(
                    "<apply><eq/>\
                     <apply><diff/><bvar><ci>t</ci><degree><cn>2</cn></degree></bvar><ci>x</ci></apply>\
                     <cn>1</cn></apply>",
                )),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Invalid);
        assert_eq!(analysed.issues()[0].kind, IssueKind::NonFirstOrderDerivative);
    }

    #[test]
    fn test_two_variables_of_integration() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("s", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(0.0))
                .with_variable(Variable::new("y", "dimensionless").with_initial_value(0.0))
                .with_math(math(&format!(
                    "{}{}",
                    ode("x", "t", "<cn>1</cn>"),
                    ode("y", "s", "<cn>1</cn>"),
                ))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Invalid);
        assert!(analysed
            .issues()
            .iter()
            .any(|issue| issue.kind == IssueKind::MultipleVariablesOfIntegration));
    }

    #[test]
    fn test_initialised_variable_of_integration() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("t", "second").with_initial_value(0.0))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(0.0))
                .with_math(math(&ode("x", "t", "<cn>1</cn>"))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Invalid);
        assert_eq!(
            analysed.issues()[0].kind,
            IssueKind::InitialisedVariableOfIntegration
        );
    }

    #[test]
    fn test_initialised_variable_of_integration_reported_once() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("t", "second").with_initial_value(0.0))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(0.0))
                .with_variable(Variable::new("y", "dimensionless").with_initial_value(0.0))
                .with_math(math(&format!(
                    "{}{}",
                    ode("x", "t", "<cn>1</cn>"),
                    ode("y", "t", "<cn>2</cn>"),
                ))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Invalid);
        assert_eq!(analysed.issue_count(), 1);
        assert_eq!(
            analysed.issues()[0].kind,
            IssueKind::InitialisedVariableOfIntegration
        );
    }

    #[test]
    fn test_dual_initialisation_across_connection() {
        let mut model = JsonModel::new("dual");
        model.components.push(
            Component::new("a")
                .with_variable(Variable::new("v", "dimensionless").with_initial_value(1.0)),
        );
        model.components.push(
            Component::new("b")
                .with_variable(Variable::new("v", "dimensionless").with_initial_value(2.0)),
        );
        model
            .connections
            .push(Connection::new("a", "b").with_pair("v", "v"));

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Invalid);
        assert_eq!(analysed.issues()[0].kind, IssueKind::DualInitialisation);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Equivalence and Batches
// ═══════════════════════════════════════════════════════════════════════════════

mod equivalence {
    use super::*;

    #[test]
    fn test_connected_variables_share_a_class() {
        let mut model = JsonModel::new("connected");
        model.components.push(
            Component::new("env")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("k", "dimensionless").with_initial_value(2.0)),
        );
        model.components.push(
            Component::new("cell")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("k", "dimensionless"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(1.0))
                .with_math(math(&ode("x", "t", "<ci>k</ci>"))),
        );
        model.connections.push(
            Connection::new("env", "cell")
                .with_pair("t", "t")
                .with_pair("k", "k"),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Ode);
        assert_eq!(analysed.variable_count(), 1);
        assert_eq!(analysed.variables()[0].initial_value_variable.component, "env");
        assert_eq!(analysed.voi().unwrap().variable.component, "env");
    }

    #[test]
    fn test_equivalent_variables_query() {
        let mut model = JsonModel::new("connected");
        model.components.push(
            Component::new("env").with_variable(Variable::new("t", "second")),
        );
        model.components.push(
            Component::new("cell")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(1.0))
                .with_math(math(&ode("x", "t", "<cn>1</cn>"))),
        );
        model
            .connections
            .push(Connection::new("env", "cell").with_pair("t", "t"));

        let analysed = Analyser::new().analyse(&model);
        let env_t = analysed.voi().unwrap().variable.clone();
        let cell_t = DeclaredVariable {
            component: "cell".to_string(),
            name: "t".to_string(),
            units: "second".to_string(),
            initial_value: None,
        };
        let x = analysed.states()[0].variable.clone();
        let stranger = DeclaredVariable {
            component: "nowhere".to_string(),
            ..x.clone()
        };

        assert!(analysed.are_equivalent_variables(&env_t, &cell_t));
        assert!(analysed.are_equivalent_variables(&x, &x));
        assert!(!analysed.are_equivalent_variables(&env_t, &x));
        assert!(!analysed.are_equivalent_variables(&x, &stranger));
    }

    #[test]
    fn test_needed_functions() {
        let model = single(
            Component::new("main")
                .with_variable(Variable::new("a", "dimensionless").with_initial_value(1.0))
                .with_variable(Variable::new("b", "dimensionless").with_initial_value(2.0))
                .with_variable(Variable::new("c", "dimensionless"))
                .with_variable(Variable::new("d", "dimensionless"))
                .with_variable(Variable::new("e", "dimensionless"))
                .with_math(math(&format!(
                    "{}{}{}",
                    assign("c", "<apply><sec/><ci>a</ci></apply>"),
                    assign("d", "<apply><min/><ci>a</ci><ci>b</ci></apply>"),
                    assign("e", "<apply><lt/><ci>a</ci><ci>b</ci></apply>"),
                ))),
        );

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Algebraic);
        assert!(analysed.need_sec_function());
        assert!(analysed.need_min_function());
        assert!(analysed.need_lt_function());
        assert!(!analysed.need_max_function());
        assert!(!analysed.need_xor_function());
        assert_eq!(
            analysed.needed_functions().collect::<Vec<_>>(),
            vec![MathFunction::Lt, MathFunction::Min, MathFunction::Sec]
        );
    }

    #[test]
    fn test_results_cross_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<cellgen::AnalysedModel>();
        assert_send_sync::<cellgen::GeneratorProfile>();
    }

    #[test]
    fn test_analyse_all_keeps_order() {
        let models: Vec<JsonModel> = (0..8)
            .map(|i| {
                let mut model = single(
                    Component::new("main")
                        .with_variable(Variable::new("x", "dimensionless"))
                        .with_math(math(&assign("x", &format!("<cn>{}</cn>", i)))),
                );
                model.name = format!("model_{}", i);
                model
            })
            .collect();

        let analysed = analyse_all(&models);
        assert_eq!(analysed.len(), 8);
        assert!(analysed
            .iter()
            .all(|model| model.model_type() == ModelType::Algebraic));
    }
}
