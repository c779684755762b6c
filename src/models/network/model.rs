use derive_more::Display;
use good_lp::{constraint, Expression};
use itertools::iproduct;
use log::{info, trace};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use typed_index_collections::TiVec;

use super::sets_and_parameters::{BdcIndex, HospitalIndex, Parameters, Sets};
use crate::models::mip::{Mip, Sense, Var};
use crate::models::utils::AddVars;
use crate::problem::Problem;

/// Name of the network cost objective
pub const COST: &str = "obj1";
/// Name of the punctuality objective
pub const PUNCTUALITY: &str = "obj2";

/// How the tardiness part of the punctuality objective is summed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PunctualityForm {
    /// `sum_i EE[i] + sum_i GG[i]`
    #[default]
    #[display(fmt = "indexed")]
    Indexed,
    /// Every hospital term adds the whole tardiness vector: `sum_i EE[i] + |H| * sum_k GG[k]`
    #[display(fmt = "aggregate")]
    Aggregate,
}

impl FromStr for PunctualityForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indexed" => Ok(PunctualityForm::Indexed),
            "aggregate" => Ok(PunctualityForm::Aggregate),
            other => Err(format!("unknown punctuality form `{other}`")),
        }
    }
}

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Variables {
    /// 1 if the arc from node i to node j is traversed
    pub x: Vec<Vec<Var>>,
    /// 1 if BDC d is open
    pub y: TiVec<BdcIndex, Var>,
    /// units of blood shipped from node i to node j
    pub z: Vec<Vec<Var>>,
    /// position of hospital i in its route
    pub U: TiVec<HospitalIndex, Var>,
    /// arrival time at hospital i
    pub v: TiVec<HospitalIndex, Var>,
    /// tardiness at hospital i
    pub GG: TiVec<HospitalIndex, Var>,
    /// earliness at hospital i
    pub EE: TiVec<HospitalIndex, Var>,
}

/// The blood supply network design model, with both objectives registered and neither active
#[derive(Debug, Clone)]
pub struct NetworkModel {
    pub model: Mip,
    pub vars: Variables,
}

#[allow(non_snake_case)]
impl NetworkModel {
    /// Builds the model for an already validated problem
    pub fn create_instance(problem: &Problem, form: PunctualityForm) -> NetworkModel {
        let sets = Sets::new(problem);
        let parameters = Parameters::new(problem);
        NetworkModel::build(&sets, &parameters, form)
    }

    pub fn build(sets: &Sets, parameters: &Parameters, form: PunctualityForm) -> NetworkModel {
        info!(
            "Building network design model with {} hospitals and {} BDCs",
            sets.H.len(),
            sets.D.len()
        );

        let mut model = Mip::new("blood_supply_network");

        //*************CREATE VARIABLES*************//
        let N = sets.N.len();
        let H = sets.H.len();
        let D = sets.D.len();

        let vars = Variables {
            x: (N, N).binary(&mut model, "x"),
            y: D.binary(&mut model, "y").into(),
            z: (N, N).int(&mut model, "z"),
            U: H.cont(&mut model, "U").into(),
            v: H.cont(&mut model, "v").into(),
            GG: H.cont(&mut model, "GG").into(),
            EE: H.cont(&mut model, "EE").into(),
        };

        // ******************** ADD CONSTRAINTS ********************
        Self::single_visit_constraints(&mut model, sets, &vars);
        Self::subtour_elimination_constraints(&mut model, sets, parameters, &vars);
        Self::flow_constraints(&mut model, sets, parameters, &vars);
        Self::open_bdc_constraints(&mut model, sets, &vars);
        Self::arrival_time_constraints(&mut model, sets, parameters, &vars);
        Self::punctuality_constraints(&mut model, sets, parameters, &vars);

        // ******************** OBJECTIVES ********************
        let cost = Self::cost(sets, parameters, &vars);
        let punctuality = Self::punctuality(sets, &vars, form);
        model.add_objective(COST, cost, Sense::Minimize);
        model.add_objective(PUNCTUALITY, punctuality, Sense::Minimize);

        trace!(
            "network design model has {} variables and {} constraints",
            model.num_vars(),
            model.constrs().len()
        );

        NetworkModel { model, vars }
    }

    /// every hospital is entered exactly once, either from a BDC or from another hospital
    fn single_visit_constraints(model: &mut Mip, sets: &Sets, vars: &Variables) {
        let x = &vars.x;
        for &j in &sets.H {
            let nj = *sets.hospital(j);
            let lhs = sets
                .D
                .iter()
                .map(|&d| x[*sets.bdc(d)][nj])
                .chain(sets.other_hospitals(j).map(|i| x[*sets.hospital(i)][nj]))
                .sum::<Expression>();
            model.add_constr(&format!("hospital_visited_once_{}", *j), constraint!(lhs == 1.0));
        }
    }

    /// MTZ-style constraints ruling out cycles among hospitals
    fn subtour_elimination_constraints(
        model: &mut Mip,
        sets: &Sets,
        parameters: &Parameters,
        vars: &Variables,
    ) {
        let (x, U, s) = (&vars.x, &vars.U, parameters.s);

        for (&i, &j) in iproduct!(&sets.H, &sets.H) {
            if i == j {
                continue;
            }
            let (ni, nj) = (*sets.hospital(i), *sets.hospital(j));
            let lhs = U[i] - U[j] + s * x[ni][nj] + (s - 2.0) * x[nj][ni];
            model.add_constr(
                &format!("subtour_elimination1_{}_{}", *i, *j),
                constraint!(lhs <= s - 1.0),
            );
        }

        // a hospital with outgoing hospital arcs must have a positive position
        let H = sets.H.len() as f64;
        for &i in &sets.H {
            let ni = *sets.hospital(i);
            let lhs = sets
                .other_hospitals(i)
                .map(|j| x[ni][*sets.hospital(j)])
                .sum::<Expression>();
            let rhs = H * U[i];
            model.add_constr(
                &format!("subtour_elimination2_{}", *i),
                constraint!(lhs <= rhs),
            );
        }
    }

    fn flow_constraints(model: &mut Mip, sets: &Sets, parameters: &Parameters, vars: &Variables) {
        let (x, y, z) = (&vars.x, &vars.y, &vars.z);
        let (h, p) = (&parameters.h, &parameters.p);
        let shipped = |d: BdcIndex| {
            let nd = *sets.bdc(d);
            sets.H
                .iter()
                .map(|&i| z[nd][*sets.hospital(i)])
                .sum::<Expression>()
        };

        // a BDC ships exactly the demand of the hospitals it serves directly
        for &d in &sets.D {
            let nd = *sets.bdc(d);
            let lhs = shipped(d);
            let rhs = sets
                .H
                .iter()
                .map(|&i| h[i] * x[nd][*sets.hospital(i)])
                .sum::<Expression>();
            model.add_constr(&format!("meet_blood_needs_{}", *d), constraint!(lhs == rhs));
        }

        // a BDC ships at most its capacity, and nothing if it is closed
        for &d in &sets.D {
            let lhs = shipped(d);
            let rhs = p[d] * y[d];
            model.add_constr(&format!("BDC_blood_capacity_{}", *d), constraint!(lhs <= rhs));
        }

        // every hospital receives at least its demand
        for &i in &sets.H {
            let ni = *sets.hospital(i);
            let lhs = sets
                .D
                .iter()
                .map(|&d| z[*sets.bdc(d)][ni])
                .chain(sets.other_hospitals(i).map(|j| z[*sets.hospital(j)][ni]))
                .sum::<Expression>();
            model.add_constr(
                &format!("meet_hospital_demand_{}", *i),
                constraint!(lhs >= h[i]),
            );
        }

        // hospital to hospital shipments only on selected arcs, bounded by the destination demand
        for (&i, &j) in iproduct!(&sets.H, &sets.H) {
            if i == j {
                continue;
            }
            let (ni, nj) = (*sets.hospital(i), *sets.hospital(j));
            model.add_constr(
                &format!("routing1_{}_{}", *i, *j),
                constraint!(z[ni][nj] <= h[j] * x[ni][nj]),
            );
        }

        // BDC to hospital shipments only on selected arcs, bounded by the destination demand
        for (&d, &i) in iproduct!(&sets.D, &sets.H) {
            let (nd, ni) = (*sets.bdc(d), *sets.hospital(i));
            model.add_constr(
                &format!("routing2_{}_{}", *d, *i),
                constraint!(z[nd][ni] <= h[i] * x[nd][ni]),
            );
        }

        // a hospital forwards at most what it received from BDCs
        for &i in &sets.H {
            let ni = *sets.hospital(i);
            let lhs = sets
                .D
                .iter()
                .map(|&d| z[*sets.bdc(d)][ni])
                .sum::<Expression>();
            let rhs = sets
                .other_hospitals(i)
                .map(|j| z[ni][*sets.hospital(j)])
                .sum::<Expression>();
            model.add_constr(
                &format!("blood_relationship_BDCs_hospitals_{}", *i),
                constraint!(lhs >= rhs),
            );
        }
    }

    fn open_bdc_constraints(model: &mut Mip, sets: &Sets, vars: &Variables) {
        for &o in &sets.O {
            model.add_constr(
                &format!("open_stationary_BDCs_{}", *o),
                constraint!(vars.y[o] == 1.0),
            );
        }
    }

    fn arrival_time_constraints(
        model: &mut Mip,
        sets: &Sets,
        parameters: &Parameters,
        vars: &Variables,
    ) {
        let (x, v) = (&vars.x, &vars.v);

        // arrival directly from a BDC takes the travel time of the selected arc
        for &i in &sets.H {
            let ni = sets.hospital(i);
            let rhs = sets
                .D
                .iter()
                .map(|&d| parameters.tn(sets.bdc(d), ni) * x[*sets.bdc(d)][*ni])
                .sum::<Expression>();
            model.add_constr(&format!("arrival_time1_{}", *i), constraint!(v[i] == rhs));
        }

        // arrival is bounded by the arrivals at the other hospitals plus the travel time of a selected arc
        for &j in &sets.H {
            let nj = sets.hospital(j);
            let rhs = sets
                .other_hospitals(j)
                .map(|i| {
                    let ni = sets.hospital(i);
                    parameters.tn(ni, nj) * x[*ni][*nj] + v[i]
                })
                .sum::<Expression>();
            model.add_constr(&format!("arrival_time2_{}", *j), constraint!(v[j] <= rhs));
        }
    }

    /// tardiness and earliness measure the violation of the time windows
    fn punctuality_constraints(
        model: &mut Mip,
        sets: &Sets,
        parameters: &Parameters,
        vars: &Variables,
    ) {
        let (v, GG, EE) = (&vars.v, &vars.GG, &vars.EE);
        for &i in &sets.H {
            model.add_constr(
                &format!("tardiness_{}", *i),
                constraint!(GG[i] >= v[i] - parameters.b[i]),
            );
            model.add_constr(
                &format!("earliness_{}", *i),
                constraint!(EE[i] >= parameters.e[i] - v[i]),
            );
        }
    }

    /// opening costs plus transport cost over every pair of nodes
    pub fn cost(sets: &Sets, parameters: &Parameters, vars: &Variables) -> Expression {
        let opening = sets
            .D
            .iter()
            .map(|&d| parameters.g[d] * vars.y[d])
            .sum::<Expression>();

        let transport = iproduct!(&sets.N, &sets.N)
            .map(|(&i, &j)| {
                parameters.u * parameters.tn(i, j) / parameters.Q * vars.z[*i][*j]
            })
            .sum::<Expression>();

        opening + transport
    }

    /// total earliness and tardiness over all hospitals
    pub fn punctuality(sets: &Sets, vars: &Variables, form: PunctualityForm) -> Expression {
        let earliness = sets.H.iter().map(|&i| vars.EE[i]).sum::<Expression>();
        let tardiness = match form {
            PunctualityForm::Indexed => sets.H.iter().map(|&i| vars.GG[i]).sum::<Expression>(),
            PunctualityForm::Aggregate => sets
                .H
                .iter()
                .map(|_| vars.GG.iter().sum::<Expression>())
                .sum::<Expression>(),
        };
        earliness + tardiness
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::mip::Solution;
    use crate::models::network::sets_and_parameters::NodeIndex;
    use crate::models::mip::{ConstrSense, Violation};
    use crate::problem::tests::{small, small_data};
    use crate::problem::{Bdc, Hospital, ProblemData};

    /// The plan of the small instance where the BDC serves both hospitals directly
    pub fn direct_plan(network: &NetworkModel, sets: &Sets) -> Solution {
        let vars = &network.vars;
        let d = sets.bdc(BdcIndex(0));
        let (h1, h2) = (HospitalIndex(0), HospitalIndex(1));

        let mut solution = Solution::default();
        solution.set(vars.y[BdcIndex(0)], 1.0);
        solution.set(vars.x[*d][0], 1.0);
        solution.set(vars.x[*d][1], 1.0);
        solution.set(vars.z[*d][0], 10.0);
        solution.set(vars.z[*d][1], 20.0);
        solution.set(vars.v[h1], 2.0);
        solution.set(vars.v[h2], 2.0);
        solution
    }

    fn violated(network: &NetworkModel, solution: &Solution) -> Vec<String> {
        network
            .model
            .violations(solution, 1e-6)
            .iter()
            .map(|v| v.name().to_string())
            .collect()
    }

    /// One BDC and three hospitals, travel time 2 between every pair of distinct nodes
    fn three_hospitals() -> Problem {
        let hospital = |name: &str, demand: f64| Hospital {
            name: name.to_string(),
            demand,
            earliest: 0.0,
            latest: 50.0,
        };
        let t = |i: usize, j: usize| if i == j { 0.0 } else { 2.0 };

        Problem::new(ProblemData {
            hospitals: vec![
                hospital("H1", 20.0),
                hospital("H2", 10.0),
                hospital("H3", 10.0),
            ],
            bdcs: vec![Bdc {
                name: "BDC1".to_string(),
                opening_cost: 50.0,
                capacity: 100.0,
            }],
            open_bdcs: vec![],
            travel_times: (0..4).map(|i| (0..4).map(|j| t(i, j)).collect()).collect(),
            unit_cost: 1.0,
            capacity_divisor: 1.0,
            scale: 3.0,
            aggregate_demand: None,
        })
        .unwrap()
    }

    /// BDC -> H1 -> H2 with H3 served directly. H1 forwards the demand of H2.
    fn chain_plan(network: &NetworkModel) -> Solution {
        let vars = &network.vars;
        let d = 3;
        let mut solution = Solution::default();
        solution.set(vars.y[BdcIndex(0)], 1.0);
        solution.set(vars.x[d][0], 1.0);
        solution.set(vars.x[0][1], 1.0);
        solution.set(vars.x[d][2], 1.0);
        solution.set(vars.z[d][0], 20.0);
        solution.set(vars.z[0][1], 10.0);
        solution.set(vars.z[d][2], 10.0);
        solution.set(vars.U[HospitalIndex(0)], 1.0);
        solution.set(vars.U[HospitalIndex(1)], 2.0);
        solution.set(vars.v[HospitalIndex(0)], 2.0);
        solution.set(vars.v[HospitalIndex(2)], 2.0);
        solution
    }

    fn chain() -> (NetworkModel, Solution) {
        let network = NetworkModel::create_instance(&three_hospitals(), PunctualityForm::Indexed);
        let solution = chain_plan(&network);
        (network, solution)
    }

    #[test]
    fn chain_is_feasible_next_to_a_direct_delivery() {
        let (network, solution) = chain();
        assert_eq!(violated(&network, &solution), Vec::<String>::new());
        // opening 50 plus 2 per unit over 40 units
        assert_eq!(network.model.evaluate_objective(COST, &solution), Ok(130.0));
    }

    #[test]
    fn lone_chain_is_cut_off_by_the_arrival_rows() {
        // arrival_time1 is an equality, so a hospital entered from another hospital has arrival 0.
        // Its predecessor's arrival is then bounded by 0 through arrival_time2.
        let mut data = small_data();
        data.hospitals[1].demand = 10.0;
        let problem = Problem::new(data).unwrap();
        let network = NetworkModel::create_instance(&problem, PunctualityForm::Indexed);
        let vars = &network.vars;

        let mut solution = Solution::default();
        solution.set(vars.y[BdcIndex(0)], 1.0);
        solution.set(vars.x[2][0], 1.0);
        solution.set(vars.x[0][1], 1.0);
        solution.set(vars.z[2][0], 10.0);
        solution.set(vars.z[0][1], 10.0);
        solution.set(vars.U[HospitalIndex(0)], 1.0);
        solution.set(vars.U[HospitalIndex(1)], 2.0);
        solution.set(vars.v[HospitalIndex(0)], 2.0);

        assert_eq!(violated(&network, &solution), vec!["arrival_time2_0"]);
    }

    #[test]
    fn shipping_on_an_unselected_arc_is_rejected() {
        let (network, mut solution) = chain();
        solution.set(network.vars.z[1][2], 5.0);
        solution.set(network.vars.z[3][1], 5.0);

        let names = violated(&network, &solution);
        assert!(names.contains(&"routing1_1_2".to_string()), "{:?}", names);
        assert!(names.contains(&"routing2_0_1".to_string()), "{:?}", names);
    }

    #[test]
    fn forwarding_more_than_received_is_rejected() {
        let (network, mut solution) = chain();
        solution.set(network.vars.z[3][0], 5.0);

        let names = violated(&network, &solution);
        assert!(
            names.contains(&"blood_relationship_BDCs_hospitals_0".to_string()),
            "{:?}",
            names
        );
    }

    #[test]
    fn outgoing_arc_needs_a_positive_position() {
        let (network, mut solution) = chain();
        solution.set(network.vars.U[HospitalIndex(0)], 0.0);
        solution.set(network.vars.U[HospitalIndex(1)], 1.0);

        assert_eq!(violated(&network, &solution), vec!["subtour_elimination2_0"]);
    }

    #[test]
    fn arrival_is_bounded_through_the_predecessor() {
        let (network, mut solution) = chain();
        let v = network.vars.v[HospitalIndex(1)];

        // H1 arrives at 2 and H3 at 2, the arc H1 -> H2 takes 2
        solution.set(v, 6.0);
        assert_eq!(violated(&network, &solution), vec!["arrival_time1_1"]);

        // rows keep every variable on the left
        solution.set(v, 6.5);
        let violations = network.model.violations(&solution, 1e-6);
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations[1],
            Violation::Constraint {
                name: "arrival_time2_1".to_string(),
                lhs: 0.5,
                sense: ConstrSense::Le,
                rhs: 0.0,
                amount: 0.5,
            }
        );
    }

    #[test]
    fn random_instances_can_be_served_directly() {
        use rand::SeedableRng;

        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        for (hospitals, bdcs) in [(1, 1), (2, 1), (3, 1), (6, 2)] {
            let problem = Problem::random(hospitals, bdcs, &mut rng).unwrap();
            let sets = Sets::new(&problem);
            let parameters = Parameters::new(&problem);
            let network = NetworkModel::build(&sets, &parameters, PunctualityForm::Indexed);
            let vars = &network.vars;

            let d = BdcIndex(0);
            let nd = sets.bdc(d);
            let mut solution = Solution::default();
            solution.set(vars.y[d], 1.0);
            for &o in &sets.O {
                solution.set(vars.y[o], 1.0);
            }
            for &i in &sets.H {
                let ni = sets.hospital(i);
                let arrival = parameters.tn(nd, ni);
                solution.set(vars.x[*nd][*ni], 1.0);
                solution.set(vars.z[*nd][*ni], parameters.h[i]);
                solution.set(vars.v[i], arrival);
                solution.set(vars.GG[i], (arrival - parameters.b[i]).max(0.0));
                solution.set(vars.EE[i], (parameters.e[i] - arrival).max(0.0));
            }

            assert_eq!(network.model.violations(&solution, 1e-6), vec![]);
        }
    }

    #[test]
    fn direct_plan_is_feasible_with_known_objectives() {
        let problem = small();
        let sets = Sets::new(&problem);
        let network = NetworkModel::create_instance(&problem, PunctualityForm::Indexed);
        let solution = direct_plan(&network, &sets);

        assert_eq!(network.model.violations(&solution, 1e-6), vec![]);
        assert_eq!(network.model.evaluate_objective(COST, &solution), Ok(110.0));
        assert_eq!(
            network.model.evaluate_objective(PUNCTUALITY, &solution),
            Ok(0.0)
        );
    }

    #[test]
    fn second_entry_into_a_hospital_is_rejected() {
        let problem = small();
        let sets = Sets::new(&problem);
        let network = NetworkModel::create_instance(&problem, PunctualityForm::Indexed);
        let mut solution = direct_plan(&network, &sets);
        solution.set(network.vars.x[0][1], 1.0);

        let violated = network
            .model
            .violations(&solution, 1e-6)
            .iter()
            .map(|v| v.name().to_string())
            .collect::<Vec<_>>();
        assert!(violated.contains(&"hospital_visited_once_1".to_string()));
    }

    #[test]
    fn closed_bdc_cannot_ship() {
        let problem = small();
        let sets = Sets::new(&problem);
        let network = NetworkModel::create_instance(&problem, PunctualityForm::Indexed);
        let mut solution = direct_plan(&network, &sets);
        solution.set(network.vars.y[BdcIndex(0)], 0.0);

        let violated = network.model.violations(&solution, 1e-6);
        assert_eq!(violated.len(), 1);
        assert_eq!(violated[0].name(), "BDC_blood_capacity_0");
    }

    #[test]
    fn two_hospital_cycle_is_rejected() {
        let problem = small();
        let network = NetworkModel::create_instance(&problem, PunctualityForm::Indexed);
        let vars = &network.vars;

        let mut solution = Solution::default();
        solution.set(vars.x[0][1], 1.0);
        solution.set(vars.x[1][0], 1.0);
        solution.set(vars.U[HospitalIndex(0)], 1.0);
        solution.set(vars.U[HospitalIndex(1)], 1.0);

        let violated = network
            .model
            .violations(&solution, 1e-6)
            .iter()
            .map(|v| v.name().to_string())
            .collect::<Vec<_>>();
        assert!(violated.contains(&"subtour_elimination1_0_1".to_string()));
    }

    #[test]
    fn forced_open_bdc_gets_a_constraint() {
        let mut data = small_data();
        data.open_bdcs = vec!["BDC1".to_string()];
        let problem = Problem::new(data).unwrap();
        let sets = Sets::new(&problem);
        let network = NetworkModel::create_instance(&problem, PunctualityForm::Indexed);

        let mut solution = direct_plan(&network, &sets);
        assert!(network.model.violations(&solution, 1e-6).is_empty());

        solution.set(network.vars.y[BdcIndex(0)], 0.0);
        let names = network
            .model
            .violations(&solution, 1e-6)
            .iter()
            .map(|v| v.name().to_string())
            .collect::<Vec<_>>();
        assert!(names.contains(&"open_stationary_BDCs_0".to_string()));
    }

    #[test]
    fn late_arrival_is_counted_as_tardiness() {
        let mut data = small_data();
        data.hospitals[0].latest = 1.0;
        let problem = Problem::new(data).unwrap();
        let sets = Sets::new(&problem);
        let network = NetworkModel::create_instance(&problem, PunctualityForm::Indexed);

        let mut solution = direct_plan(&network, &sets);
        let violated = network.model.violations(&solution, 1e-6);
        assert_eq!(violated[0].name(), "tardiness_0");

        solution.set(network.vars.GG[HospitalIndex(0)], 1.0);
        assert!(network.model.violations(&solution, 1e-6).is_empty());
        assert_eq!(
            network.model.evaluate_objective(PUNCTUALITY, &solution),
            Ok(1.0)
        );
    }

    #[test]
    fn punctuality_forms_differ_only_in_the_tardiness_weight() {
        let problem = small();
        let sets = Sets::new(&problem);
        let indexed = NetworkModel::create_instance(&problem, PunctualityForm::Indexed);
        let aggregate = NetworkModel::create_instance(&problem, PunctualityForm::Aggregate);

        let coefficient = |network: &NetworkModel, var: Var| {
            let objective = network.model.objective(PUNCTUALITY).unwrap();
            network
                .model
                .coefficients(&objective.expr)
                .into_iter()
                .find(|(v, _)| *v == var)
                .map(|(_, c)| c)
        };

        for &i in &sets.H {
            assert_eq!(coefficient(&indexed, indexed.vars.GG[i]), Some(1.0));
            assert_eq!(coefficient(&indexed, indexed.vars.EE[i]), Some(1.0));
            assert_eq!(coefficient(&aggregate, aggregate.vars.GG[i]), Some(2.0));
            assert_eq!(coefficient(&aggregate, aggregate.vars.EE[i]), Some(1.0));
        }
    }

    #[test]
    fn cost_counts_every_node_pair() {
        let problem = small();
        let sets = Sets::new(&problem);
        let network = NetworkModel::create_instance(&problem, PunctualityForm::Indexed);
        let objective = network.model.objective(COST).unwrap();

        // opening cost plus one transport term per pair of distinct nodes
        let terms = network.model.coefficients(&objective.expr);
        assert_eq!(terms.len(), 1 + 6);
        let h1 = NodeIndex(0);
        let d = sets.bdc(BdcIndex(0));
        assert!(terms.contains(&(network.vars.z[*d][*h1], 2.0)));
    }

    #[test]
    fn forms_parse_from_their_display() {
        for form in [PunctualityForm::Indexed, PunctualityForm::Aggregate] {
            assert_eq!(form.to_string().parse::<PunctualityForm>(), Ok(form));
        }
        assert!("literal".parse::<PunctualityForm>().is_err());
    }
}
