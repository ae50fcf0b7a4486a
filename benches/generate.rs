use cellgen::analyser::Analyser;
use cellgen::generator::{Generator, GeneratorProfile};
use cellgen::json::{Component, Connection, JsonModel, Variable};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// A chain of `n` coupled decays: x_i' = k*(x_{i-1} - x_i)
fn chain(n: usize) -> JsonModel {
    let mut model = JsonModel::new("chain");
    model.components.push(
        Component::new("env")
            .with_variable(Variable::new("t", "second"))
            .with_variable(Variable::new("k", "dimensionless").with_initial_value(0.1)),
    );

    let mut body = String::new();
    let mut component = Component::new("cells")
        .with_variable(Variable::new("t", "second"))
        .with_variable(Variable::new("k", "dimensionless"))
        .with_variable(Variable::new("x0", "dimensionless").with_initial_value(1.0));
    for i in 1..=n {
        component = component
            .with_variable(Variable::new(format!("x{}", i), "dimensionless").with_initial_value(0.0))
            .with_variable(Variable::new(format!("f{}", i), "dimensionless"));
        body.push_str(&format!(
            "<apply><eq/><ci>f{i}</ci><apply><times/><ci>k</ci>\
             <apply><minus/><ci>x{p}</ci><ci>x{i}</ci></apply></apply></apply>\
             <apply><eq/><apply><diff/><bvar><ci>t</ci></bvar><ci>x{i}</ci></apply><ci>f{i}</ci></apply>",
            i = i,
            p = i - 1
        ));
    }
    body.push_str(
        "<apply><eq/><apply><diff/><bvar><ci>t</ci></bvar><ci>x0</ci></apply><cn>0</cn></apply>",
    );
    model.components.push(component.with_math(format!("<math>{}</math>", body)));
    model.connections.push(
        Connection::new("env", "cells")
            .with_pair("t", "t")
            .with_pair("k", "k"),
    );
    model
}

fn analyse(model: &JsonModel, n: usize) {
    for _ in 0..n {
        black_box(Analyser::new().analyse(model));
    }
}

fn generate(model: &JsonModel, profile: &GeneratorProfile, n: usize) {
    let analysed = Analyser::new().analyse(model);
    for _ in 0..n {
        black_box(Generator::new(&analysed, profile).generate());
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let model = chain(50);
    let profile = GeneratorProfile::c();
    c.bench_function("analyse chain 50", |b| b.iter(|| analyse(black_box(&model), 10)));
    c.bench_function("generate c chain 50", |b| {
        b.iter(|| generate(black_box(&model), &profile, 10))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
