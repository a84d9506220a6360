//! The standard function, constant and option tables.

use rasc_ir::ValueType::{self, List, Scalar};

use crate::options::{OptionKind, OptionSpec};
use crate::{math, ops, FunctionImpl, FunctionInfo, Provider, RandomFn, Registry, RuntimeField};

const NONE: &[ValueType] = &[];
const S: &[ValueType] = &[Scalar];
const L: &[ValueType] = &[List];
const SS: &[ValueType] = &[Scalar, Scalar];
const SL: &[ValueType] = &[Scalar, List];
const LS: &[ValueType] = &[List, Scalar];
const LL: &[ValueType] = &[List, List];

fn math1(registry: &mut Registry, name: &'static str, f: fn(f64) -> f64) {
    registry.register(FunctionInfo {
        name,
        params: S,
        ret: Scalar,
        provider: Provider::Math,
        imp: FunctionImpl::Unary(f),
        volatile: false,
    });
}

fn math2(registry: &mut Registry, name: &'static str, f: fn(f64, f64) -> f64) {
    registry.register(FunctionInfo {
        name,
        params: SS,
        ret: Scalar,
        provider: Provider::Math,
        imp: FunctionImpl::Binary(f),
        volatile: false,
    });
}

fn reduce(registry: &mut Registry, name: &'static str, f: fn(&[f64]) -> f64) {
    registry.register(FunctionInfo {
        name,
        params: L,
        ret: Scalar,
        provider: Provider::Math,
        imp: FunctionImpl::Reduce(f),
        volatile: false,
    });
}

/// Register a unary operator for scalars and, element-wise, for lists.
fn runtime1(registry: &mut Registry, name: &'static str, f: fn(f64) -> f64) {
    for (params, ret) in [(S, Scalar), (L, List)] {
        registry.register(FunctionInfo {
            name,
            params,
            ret,
            provider: Provider::Runtime,
            imp: FunctionImpl::Unary(f),
            volatile: false,
        });
    }
}

/// Register a binary operator for every scalar/list combination.
fn runtime2(registry: &mut Registry, name: &'static str, f: fn(f64, f64) -> f64) {
    for (params, ret) in [(SS, Scalar), (SL, List), (LS, List), (LL, List)] {
        registry.register(FunctionInfo {
            name,
            params,
            ret,
            provider: Provider::Runtime,
            imp: FunctionImpl::Binary(f),
            volatile: false,
        });
    }
}

fn proxy(registry: &mut Registry, name: &'static str, field: RuntimeField) {
    registry.register(FunctionInfo {
        name,
        params: NONE,
        ret: Scalar,
        provider: Provider::Proxy,
        imp: FunctionImpl::Proxy(field),
        volatile: false,
    });
}

pub(crate) fn register_standard(registry: &mut Registry) {
    // Math provider
    math1(registry, "abs", math::abs);
    math1(registry, "acos", math::acos);
    math1(registry, "asin", math::asin);
    math1(registry, "atan", math::atan);
    math2(registry, "atan2", math::atan2);
    math1(registry, "ceil", math::ceil);
    math1(registry, "cos", math::cos);
    math1(registry, "degToRad", math::deg_to_rad);
    math1(registry, "exp", math::exp);
    math1(registry, "floor", math::floor);
    math1(registry, "isinf", math::is_inf);
    math1(registry, "isnan", math::is_nan);
    math1(registry, "isnull", math::is_nan);
    math1(registry, "log", math::ln);
    math2(registry, "log", math::log_base);
    math1(registry, "radToDeg", math::rad_to_deg);
    math1(registry, "rint", math::rint);
    math1(registry, "round", math::round);
    math2(registry, "round", math::round_to);
    math1(registry, "sign", math::sign);
    math1(registry, "sin", math::sin);
    math1(registry, "sqrt", math::sqrt);
    math1(registry, "tan", math::tan);
    math2(registry, "min", math::min2);
    math2(registry, "max", math::max2);
    registry.register(FunctionInfo {
        name: "null",
        params: NONE,
        ret: Scalar,
        provider: Provider::Math,
        imp: FunctionImpl::Nullary(math::null),
        volatile: false,
    });

    // List reductions
    reduce(registry, "min", math::list_min);
    reduce(registry, "max", math::list_max);
    reduce(registry, "mean", math::mean);
    reduce(registry, "median", math::median);
    reduce(registry, "mode", math::mode);
    reduce(registry, "range", math::range);
    reduce(registry, "sdev", math::sdev);
    reduce(registry, "variance", math::variance);
    reduce(registry, "sum", math::sum);
    reduce(registry, "length", math::length);

    // Runtime operators
    runtime2(registry, "_add", ops::add);
    runtime2(registry, "_sub", ops::sub);
    runtime2(registry, "_mul", ops::mul);
    runtime2(registry, "_div", ops::div);
    runtime2(registry, "_mod", ops::rem);
    runtime2(registry, "_and", ops::and);
    runtime2(registry, "_or", ops::or);
    runtime2(registry, "_xor", ops::xor);
    runtime2(registry, "_eq", ops::eq);
    runtime2(registry, "_ne", ops::ne);
    runtime2(registry, "_lt", ops::lt);
    runtime2(registry, "_le", ops::le);
    runtime2(registry, "_gt", ops::gt);
    runtime2(registry, "_ge", ops::ge);
    runtime1(registry, "_neg", ops::neg);
    runtime1(registry, "_not", ops::not);
    runtime1(registry, "_truth", ops::truth);
    // The exponent is always scalar.
    for (params, ret) in [(SS, Scalar), (LS, List)] {
        registry.register(FunctionInfo {
            name: "_pow",
            params,
            ret,
            provider: Provider::Runtime,
            imp: FunctionImpl::Binary(ops::pow),
            volatile: false,
        });
    }
    for (name, kind) in [("rand", RandomFn::Uniform), ("randInt", RandomFn::Int)] {
        registry.register(FunctionInfo {
            name,
            params: S,
            ret: Scalar,
            provider: Provider::Runtime,
            imp: FunctionImpl::Random(kind),
            volatile: true,
        });
    }

    // Proxies
    proxy(registry, "x", RuntimeField::X);
    proxy(registry, "y", RuntimeField::Y);
    proxy(registry, "width", RuntimeField::Width);
    proxy(registry, "height", RuntimeField::Height);
    proxy(registry, "xmin", RuntimeField::XMin);
    proxy(registry, "ymin", RuntimeField::YMin);
    proxy(registry, "xmax", RuntimeField::XMax);
    proxy(registry, "ymax", RuntimeField::YMax);
    proxy(registry, "xres", RuntimeField::XRes);
    proxy(registry, "yres", RuntimeField::YRes);

    // Constants
    registry.register_constant("M_PI", std::f64::consts::PI);
    registry.register_constant("M_PI_2", std::f64::consts::FRAC_PI_2);
    registry.register_constant("M_PI_4", std::f64::consts::FRAC_PI_4);
    registry.register_constant("M_E", std::f64::consts::E);
    registry.register_constant("M_SQRT2", std::f64::consts::SQRT_2);

    // Options
    registry.register_option(OptionSpec {
        name: "outside",
        kind: OptionKind::Outside,
    });
}
