use crate::models::mip::{Mip, Solution, Var, VarType};
use std::ops::Range;
use typed_index_collections::TiVec;

pub trait AddVars {
    type Out;

    /// Create a variable for any type
    fn vars(&self, model: &mut Mip, base_name: &str, vtype: VarType, bounds: &Range<f64>)
        -> Self::Out;

    /// Binary variables
    fn binary(&self, model: &mut Mip, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Binary, &(0.0..1.0))
    }

    /// A continuous non-negative variable
    fn cont(&self, model: &mut Mip, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Continuous, &(0.0..f64::INFINITY))
    }

    /// A non-negative integer variable
    fn int(&self, model: &mut Mip, base_name: &str) -> Self::Out {
        self.vars(model, base_name, VarType::Integer, &(0.0..f64::INFINITY))
    }
}

impl AddVars for usize {
    type Out = Vec<Var>;

    fn vars(
        &self,
        model: &mut Mip,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out {
        (0..*self)
            .map(|i| model.add_var(&format!("{}_{}", base_name, i), vtype, bounds))
            .collect()
    }
}

impl AddVars for (usize, usize) {
    type Out = Vec<<usize as AddVars>::Out>;

    fn vars(
        &self,
        model: &mut Mip,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out {
        (0..self.0)
            .map(|i| {
                self.1
                    .vars(model, &format!("{}_{}", base_name, i), vtype, bounds)
            })
            .collect()
    }
}

/// Trait that reads the values of model variables out of a solution
pub trait ConvertVars {
    type Out;
    fn convert(&self, solution: &Solution) -> Self::Out;
}

impl<T: ConvertVars> ConvertVars for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert(&self, solution: &Solution) -> Self::Out {
        self.iter().map(|e| e.convert(solution)).collect()
    }
}

impl<K, T: ConvertVars> ConvertVars for TiVec<K, T> {
    type Out = TiVec<K, T::Out>;

    fn convert(&self, solution: &Solution) -> Self::Out {
        self.raw.iter().map(|e| e.convert(solution)).collect()
    }
}

impl ConvertVars for Var {
    type Out = f64;

    fn convert(&self, solution: &Solution) -> Self::Out {
        solution.value(*self)
    }
}
