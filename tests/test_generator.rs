//! Integration tests for code generation
//!
//! Each test analyses a small model and checks the generated C or Python
//! text.

use cellgen::analyser::{AnalysedModel, Analyser, ModelType};
use cellgen::generator::{GeneratedCode, Generator, GeneratorProfile, VERSION};
use cellgen::json::{Component, Connection, JsonModel, UnitTerm, UnitsDefinition, Variable};

fn math(body: &str) -> String {
    format!(
        "<math xmlns=\"http://www.w3.org/1998/Math/MathML\">{}</math>",
        body
    )
}

fn ode(variable: &str, rhs: &str) -> String {
    format!(
        "<apply><eq/><apply><diff/><bvar><ci>t</ci></bvar><ci>{}</ci></apply>{}</apply>",
        variable, rhs
    )
}

fn assign(variable: &str, rhs: &str) -> String {
    format!("<apply><eq/><ci>{}</ci>{}</apply>", variable, rhs)
}

fn analyse(component: Component) -> AnalysedModel {
    let mut model = JsonModel::new("test");
    model.components.push(component);
    Analyser::new().analyse(&model)
}

fn generate(analysed: &AnalysedModel, profile: &GeneratorProfile) -> GeneratedCode {
    Generator::new(analysed, profile).generate()
}

/// x' = 1 with x(0) = 1
fn constant_rate() -> AnalysedModel {
    analyse(
        Component::new("main")
            .with_variable(Variable::new("t", "second"))
            .with_variable(Variable::new("x", "dimensionless").with_initial_value(1.0))
            .with_math(math(&ode("x", "<cn>1</cn>"))),
    )
}

/// Constants a, b and c, and one computed constant per expression
fn constants_with(expressions: &[(&str, &str)]) -> AnalysedModel {
    let mut component = Component::new("main")
        .with_variable(Variable::new("a", "dimensionless").with_initial_value(2.0))
        .with_variable(Variable::new("b", "dimensionless").with_initial_value(3.0))
        .with_variable(Variable::new("c", "dimensionless").with_initial_value(4.0));
    let mut body = String::new();
    for (name, rhs) in expressions {
        component = component.with_variable(Variable::new(*name, "dimensionless"));
        body.push_str(&assign(name, rhs));
    }
    analyse(component.with_math(math(&body)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// C Profile
// ═══════════════════════════════════════════════════════════════════════════════

mod c_profile {
    use super::*;

    #[test]
    fn test_constant_rate_implementation() {
        let analysed = constant_rate();
        assert_eq!(analysed.model_type(), ModelType::Ode);
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;

        assert!(code.starts_with(&format!(
            "/* The content of this file was generated using the C profile of cellgen {}. */\n",
            VERSION
        )));
        assert!(code.contains("#include \"model.h\"\n"));
        assert!(code.contains("const size_t STATE_COUNT = 1;\n"));
        assert!(code.contains("const size_t VARIABLE_COUNT = 0;\n"));
        assert!(code.contains("const VariableInfo VOI_INFO = {\"t\", \"second\", \"main\"};\n"));
        assert!(code.contains(
            "const VariableInfo STATE_INFO[] = {\n    {\"x\", \"dimensionless\", \"main\"}\n};\n"
        ));
        assert!(code.contains(
            "void initializeStatesAndConstants(double *states, double *variables)\n{\n    states[0] = 1.0;\n}\n"
        ));
        assert!(code.contains(
            "void computeRates(double voi, double *states, double *rates, double *variables)\n{\n    rates[0] = 1.0;\n}\n"
        ));
        assert!(code.contains("void computeComputedConstants(double *variables)\n{\n}\n"));
        assert!(code.contains("return (double *) malloc(STATE_COUNT*sizeof(double));\n"));
    }

    #[test]
    fn test_interface_declares_ode_entry_points() {
        let analysed = constant_rate();
        let code = generate(&analysed, &GeneratorProfile::c()).interface;

        assert!(code.contains("#pragma once\n"));
        assert!(code.contains("extern const VariableInfo VOI_INFO;\n"));
        assert!(code.contains("double * createStatesArray();\n"));
        assert!(code.contains(
            "void computeRates(double voi, double *states, double *rates, double *variables);\n"
        ));
        // Longest name, units and component are "dimensionless"
        assert!(code.contains("char units[14];\n"));
        assert!(code.contains("char name[2];\n"));
        assert!(code.contains("char component[5];\n"));
    }

    #[test]
    fn test_algebraic_model_has_no_rates() {
        let analysed = constants_with(&[("d", "<apply><plus/><ci>a</ci><ci>b</ci></apply>")]);
        assert_eq!(analysed.model_type(), ModelType::Algebraic);
        let generated = generate(&analysed, &GeneratorProfile::c());

        assert!(!generated.interface.contains("computeRates"));
        assert!(!generated.interface.contains("createStatesArray"));
        assert!(!generated.implementation.contains("VOI_INFO"));
        assert!(generated
            .implementation
            .contains("    variables[3] = variables[0]+variables[1];\n"));
        assert!(generated
            .implementation
            .contains("    {\"d\", \"dimensionless\", \"main\", COMPUTED_CONSTANT}\n"));
        assert!(generated
            .implementation
            .contains("    {\"a\", \"dimensionless\", \"main\", CONSTANT},\n"));
    }

    #[test]
    fn test_nary_operators_and_precedence() {
        let analysed = constants_with(&[
            (
                "d",
                "<apply><plus/><ci>a</ci><ci>b</ci><ci>c</ci></apply>",
            ),
            (
                "e",
                "<apply><times/><apply><plus/><ci>a</ci><ci>b</ci></apply><ci>c</ci></apply>",
            ),
            (
                "f",
                "<apply><divide/><ci>a</ci><apply><times/><ci>b</ci><ci>c</ci></apply></apply>",
            ),
        ]);
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;

        assert!(code.contains(" = variables[0]+variables[1]+variables[2];\n"));
        assert!(code.contains(" = (variables[0]+variables[1])*variables[2];\n"));
        assert!(code.contains(" = variables[0]/(variables[1]*variables[2]);\n"));
    }

    #[test]
    fn test_comparison_operands_keep_their_grouping() {
        let analysed = constants_with(&[
            ("d", "<apply><not/><apply><lt/><ci>a</ci><ci>b</ci></apply></apply>"),
            (
                "e",
                "<apply><lt/><apply><eq/><ci>a</ci><ci>b</ci></apply><ci>c</ci></apply>",
            ),
            (
                "f",
                "<apply><eq/><ci>a</ci><apply><gt/><ci>b</ci><ci>c</ci></apply></apply>",
            ),
            ("g", "<apply><not/><apply><plus/><ci>a</ci><ci>b</ci></apply></apply>"),
            ("h", "<apply><not/><ci>a</ci></apply>"),
        ]);
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;

        assert!(code.contains(" = !(variables[0] < variables[1]);\n"));
        assert!(code.contains(" = (variables[0] == variables[1]) < variables[2];\n"));
        assert!(code.contains(" = variables[0] == (variables[1] > variables[2]);\n"));
        assert!(code.contains(" = !(variables[0]+variables[1]);\n"));
        assert!(code.contains(" = !variables[0];\n"));
    }

    #[test]
    fn test_negative_literal_after_minus() {
        let analysed = constants_with(&[
            ("d", "<apply><minus/><ci>a</ci><cn>-1</cn></apply>"),
            ("e", "<apply><minus/><cn>-2</cn></apply>"),
            ("f", "<apply><plus/><ci>a</ci><cn>-3</cn></apply>"),
        ]);
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;

        assert!(code.contains(" = variables[0]-(-1.0);\n"));
        assert!(code.contains(" = -(-2.0);\n"));
        assert!(code.contains(" = variables[0]+-3.0;\n"));
        assert!(!code.contains("--"));
    }

    #[test]
    fn test_roots_and_logarithms() {
        let analysed = constants_with(&[
            ("d", "<apply><root/><ci>a</ci></apply>"),
            (
                "e",
                "<apply><root/><degree><cn>3</cn></degree><ci>a</ci></apply>",
            ),
            ("f", "<apply><log/><ci>a</ci></apply>"),
            (
                "g",
                "<apply><log/><logbase><cn>2</cn></logbase><ci>a</ci></apply>",
            ),
            (
                "h",
                "<apply><power/><ci>a</ci><cn>0.5</cn></apply>",
            ),
        ]);
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;

        assert!(code.contains(" = sqrt(variables[0]);\n"));
        assert!(code.contains(" = pow(variables[0], 1.0/3.0);\n"));
        assert!(code.contains(" = log10(variables[0]);\n"));
        assert!(code.contains(" = log(variables[0])/log(2.0);\n"));
        assert_eq!(code.matches(" = sqrt(variables[0]);\n").count(), 2);
    }

    #[test]
    fn test_piecewise_uses_conditional_operator() {
        let analysed = analyse(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(0.0))
                .with_math(math(&ode(
                    "x",
                    "<piecewise>\
                     <piece><cn>1</cn><apply><gt/><ci>t</ci><cn>1</cn></apply></piece>\
                     <otherwise><cn>0</cn></otherwise>\
                     </piecewise>",
                ))),
        );
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;
        assert!(code.contains("    rates[0] = (voi > 1.0)?1.0:0.0;\n"));
    }

    #[test]
    fn test_piecewise_without_otherwise_ends_with_nan() {
        let analysed = analyse(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(0.0))
                .with_math(math(&ode(
                    "x",
                    "<piecewise>\
                     <piece><cn>1</cn><apply><lt/><ci>t</ci><cn>1</cn></apply></piece>\
                     <piece><cn>2</cn><apply><lt/><ci>t</ci><cn>2</cn></apply></piece>\
                     </piecewise>",
                ))),
        );
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;
        assert!(code.contains("    rates[0] = (voi < 1.0)?1.0:(voi < 2.0)?2.0:sqrt(-1.0);\n"));
    }

    #[test]
    fn test_helpers_are_emitted_once() {
        let analysed = constants_with(&[
            ("d", "<apply><min/><ci>a</ci><ci>b</ci></apply>"),
            ("e", "<apply><min/><ci>b</ci><ci>c</ci></apply>"),
            ("f", "<apply><sec/><ci>a</ci></apply>"),
        ]);
        let generated = generate(&analysed, &GeneratorProfile::c());

        let code = &generated.implementation;
        assert_eq!(code.matches("double min(double x, double y)\n").count(), 1);
        assert!(code.contains("double sec(double x)\n{\n    return 1.0/cos(x);\n}\n"));
        assert!(!code.contains("double max("));
        // Helpers follow a fixed order
        let min = code.find("double min(").unwrap();
        let sec = code.find("double sec(").unwrap();
        assert!(min < sec);

        assert!(generated
            .interface
            .contains("extern double min(double x, double y);\n"));
        assert!(generated.interface.contains("extern double sec(double x);\n"));
    }

    #[test]
    fn test_state_dependent_equation_emitted_in_rates_and_variables() {
        let analysed = analyse(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(1.0))
                .with_variable(Variable::new("y", "dimensionless"))
                .with_math(math(&format!(
                    "{}{}",
                    assign("y", "<apply><times/><cn>2</cn><ci>x</ci></apply>"),
                    ode("x", "<ci>y</ci>"),
                ))),
        );
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;

        assert_eq!(code.matches("    variables[0] = 2.0*states[0];\n").count(), 2);
        assert_eq!(code.matches("    rates[0] = variables[0];\n").count(), 1);

        let rates = code.find("void computeRates(").unwrap();
        let variables = code.find("void computeVariables(").unwrap();
        let first = code.find("    variables[0] = 2.0*states[0];\n").unwrap();
        let rate = code.find("    rates[0] = variables[0];\n").unwrap();
        assert!(rates < first && first < rate && rate < variables);
    }

    #[test]
    fn test_initial_value_references_follow_literals() {
        let analysed = analyse(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value("x0"))
                .with_variable(Variable::new("x0", "dimensionless").with_initial_value(3.0))
                .with_math(math(&ode("x", "<cn>1</cn>"))),
        );
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;

        let literal = code.find("    variables[0] = 3.0;\n").unwrap();
        let reference = code.find("    states[0] = variables[0];\n").unwrap();
        assert!(literal < reference);
    }

    #[test]
    fn test_units_scaling_across_connection() {
        let mut model = JsonModel::new("scaled");
        model.units.push(UnitsDefinition::new(
            "ms",
            vec![UnitTerm::new("second").with_prefix("milli")],
        ));
        model.components.push(
            Component::new("env").with_variable(Variable::new("a", "second").with_initial_value(2.0)),
        );
        model.components.push(
            Component::new("main")
                .with_variable(Variable::new("a", "ms"))
                .with_variable(Variable::new("y", "ms"))
                .with_math(math(&assign("y", "<ci>a</ci>"))),
        );
        model
            .connections
            .push(Connection::new("env", "main").with_pair("a", "a"));

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Algebraic);
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;
        assert!(code.contains("    variables[1] = 1000.0*variables[0];\n"));
    }

    #[test]
    fn test_rates_scaled_by_voi_units() {
        let mut model = JsonModel::new("scaled_rate");
        model.units.push(UnitsDefinition::new(
            "ms",
            vec![UnitTerm::new("second").with_prefix("milli")],
        ));
        model
            .components
            .push(Component::new("env").with_variable(Variable::new("t", "second")));
        model.components.push(
            Component::new("main")
                .with_variable(Variable::new("t", "ms"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(0.0))
                .with_variable(Variable::new("y", "dimensionless"))
                .with_math(math(&format!(
                    "{}{}",
                    ode("x", "<cn>1</cn>"),
                    assign(
                        "y",
                        "<apply><diff/><bvar><ci>t</ci></bvar><ci>x</ci></apply>"
                    ),
                ))),
        );
        model
            .connections
            .push(Connection::new("env", "main").with_pair("t", "t"));

        let analysed = Analyser::new().analyse(&model);
        assert_eq!(analysed.model_type(), ModelType::Ode);
        assert_eq!(analysed.voi().unwrap().variable.units, "second");
        let code = generate(&analysed, &GeneratorProfile::c()).implementation;

        // Defined per millisecond, stored per second
        assert!(code.contains("    rates[0] = 1000.0*1.0;\n"));
        assert!(code.contains("    variables[0] = 0.001*rates[0];\n"));
    }

    #[test]
    fn test_modified_profile_is_flagged() {
        let mut profile = GeneratorProfile::c();
        profile.indent_string = "  ".to_string();
        let code = generate(&constant_rate(), &profile).implementation;

        assert!(code.contains("using a modified C profile of cellgen"));
        assert!(code.contains("const char VERSION[] = \"0.1.0.post0\";\n"));
        assert!(code.contains("\n  rates[0] = 1.0;\n"));
    }

    #[test]
    fn test_invalid_model_generates_nothing() {
        let analysed = analyse(
            Component::new("main")
                .with_variable(Variable::new("x", "dimensionless"))
                .with_math(math(&assign("x", "<ci>y</ci>"))),
        );
        assert_eq!(analysed.model_type(), ModelType::Invalid);

        let generated = generate(&analysed, &GeneratorProfile::c());
        assert!(generated.interface.is_empty());
        assert!(generated.implementation.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Python Profile
// ═══════════════════════════════════════════════════════════════════════════════

mod python_profile {
    use super::*;

    #[test]
    fn test_constant_rate_module() {
        let generated = generate(&constant_rate(), &GeneratorProfile::python());

        assert!(generated.interface.is_empty());
        let code = &generated.implementation;
        assert!(code.starts_with(&format!(
            "# The content of this file was generated using the Python profile of cellgen {}.\n",
            VERSION
        )));
        assert!(code.contains("from math import *\n"));
        assert!(code.contains("STATE_COUNT = 1\n"));
        assert!(code.contains("class VariableType(Enum):\n"));
        assert!(code.contains("def compute_rates(voi, states, rates, variables):\n    rates[0] = 1.0\n"));
        assert!(code.contains("def compute_computed_constants(variables):\n    pass\n"));
        assert!(code.contains("def initialize_states_and_constants(states, variables):\n    states[0] = 1.0\n"));
    }

    #[test]
    fn test_relations_become_helper_calls() {
        let analysed = analyse(
            Component::new("main")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "dimensionless").with_initial_value(0.0))
                .with_math(math(&ode(
                    "x",
                    "<piecewise>\
                     <piece><cn>1</cn><apply><gt/><ci>t</ci><cn>1</cn></apply></piece>\
                     <otherwise><cn>0</cn></otherwise>\
                     </piecewise>",
                ))),
        );
        let code = generate(&analysed, &GeneratorProfile::python()).implementation;

        assert!(code.contains("    rates[0] = 1.0 if gt_func(voi, 1.0) else 0.0\n"));
        assert!(code.contains("def gt_func(x, y):\n    return 1.0 if x > y else 0.0\n"));
        assert!(!code.contains("def eq_func("));
    }

    #[test]
    fn test_power_operator() {
        let analysed = constants_with(&[
            (
                "d",
                "<apply><root/><degree><cn>3</cn></degree><ci>a</ci></apply>",
            ),
            ("e", "<apply><power/><ci>a</ci><ci>b</ci></apply>"),
        ]);
        let code = generate(&analysed, &GeneratorProfile::python()).implementation;

        assert!(code.contains(" = variables[0]**(1.0/3.0)\n"));
        assert!(code.contains(" = variables[0]**variables[1]\n"));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Profiles as Data
// ═══════════════════════════════════════════════════════════════════════════════

mod profiles {
    use super::*;

    #[test]
    fn test_profile_from_json_drives_generation() {
        let mut profile = GeneratorProfile::python();
        profile.command_separator_string = ";".to_string();
        let json = profile.to_json().unwrap();

        let restored = GeneratorProfile::from_json(&json).unwrap();
        assert_eq!(restored, profile);

        let code = generate(&constant_rate(), &restored).implementation;
        assert!(code.contains("    rates[0] = 1.0;\n"));
        assert!(code.contains("a modified Python profile of"));
        assert!(code.contains("__version__ = \"0.1.0.post0\"\n"));
    }

    #[test]
    fn test_same_analysis_two_profiles() {
        let analysed = constant_rate();
        let c = generate(&analysed, &GeneratorProfile::c());
        let python = generate(&analysed, &GeneratorProfile::python());

        assert!(c.implementation.contains("rates[0] = 1.0;"));
        assert!(python.implementation.contains("rates[0] = 1.0\n"));
        assert_ne!(c.implementation, python.implementation);
    }
}
