use derive_more::Display;
use float_ord::FloatOrd;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The type used for blood quantities
pub type Quantity = f64;
/// The type used for travel times
pub type Time = f64;
/// The type used for cost
pub type Cost = f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub name: String,
    /// Units of blood required
    pub demand: Quantity,
    /// Earliest acceptable arrival time
    pub earliest: Time,
    /// Latest acceptable arrival time
    pub latest: Time,
}

/// A candidate blood distribution center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bdc {
    pub name: String,
    pub opening_cost: Cost,
    /// Units of blood the center can supply
    pub capacity: Quantity,
}

/// The raw, unvalidated instance as read from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemData {
    pub hospitals: Vec<Hospital>,
    pub bdcs: Vec<Bdc>,
    /// Names of the BDCs that are open regardless of cost
    #[serde(default)]
    pub open_bdcs: Vec<String>,
    /// Travel time between every pair of nodes. Hospitals come first, then BDCs, both in input order.
    pub travel_times: Vec<Vec<Time>>,
    pub unit_cost: f64,
    pub capacity_divisor: f64,
    pub scale: f64,
    #[serde(default)]
    pub aggregate_demand: Option<f64>,
}

/// A validated regional blood supply instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProblemData", into = "ProblemData")]
pub struct Problem {
    hospitals: Vec<Hospital>,
    bdcs: Vec<Bdc>,
    /// Positions in `bdcs` of the centers that must be open
    open_bdcs: Vec<usize>,
    travel_times: Vec<Vec<Time>>,
    unit_cost: f64,
    capacity_divisor: f64,
    scale: f64,
    aggregate_demand: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum ProblemConstructionError {
    /// There must be at least one hospital
    #[display(fmt = "the instance has no hospitals")]
    NoHospitals,
    /// There must be at least one BDC
    #[display(fmt = "the instance has no blood distribution centers")]
    NoBdcs,
    /// Two nodes share a name
    #[display(fmt = "the node name `{}` is used more than once", _0)]
    DuplicateName(String),
    /// A mandatorily open BDC is not among the BDCs
    #[display(fmt = "`{}` is listed as an open BDC but is not a BDC", _0)]
    UnknownOpenBdc(String),
    /// The size of the travel time matrix is not as expected
    #[display(
        fmt = "the travel time matrix must be {}x{}, found {} rows with row {} of length {}",
        expected,
        expected,
        rows,
        row,
        length
    )]
    TravelTimeSizeMismatch {
        expected: usize,
        rows: usize,
        row: usize,
        length: usize,
    },
    /// A parameter value lies outside of its domain
    #[display(fmt = "{} of `{}` is {}, expected {}", parameter, node, value, domain)]
    OutOfDomain {
        parameter: &'static str,
        node: String,
        value: f64,
        domain: &'static str,
    },
    /// The time window of a hospital is empty
    #[display(fmt = "hospital `{}` has earliest arrival {} after latest arrival {}", hospital, earliest, latest)]
    EmptyTimeWindow {
        hospital: String,
        earliest: Time,
        latest: Time,
    },
    /// The subtour elimination scale must be at least the number of hospitals
    #[display(fmt = "scale {} is smaller than the number of hospitals ({})", scale, hospitals)]
    ScaleTooSmall { scale: f64, hospitals: usize },
}

impl std::error::Error for ProblemConstructionError {}

const NON_NEGATIVE_REAL: &str = "a finite non-negative real";
const NON_NEGATIVE_INTEGER: &str = "a non-negative integer";
const POSITIVE_REAL: &str = "a finite positive real";

fn non_negative_real(
    parameter: &'static str,
    node: &str,
    value: f64,
) -> Result<(), ProblemConstructionError> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(ProblemConstructionError::OutOfDomain {
        parameter,
        node: node.to_string(),
        value,
        domain: NON_NEGATIVE_REAL,
    })
}

fn non_negative_integer(
    parameter: &'static str,
    node: &str,
    value: f64,
) -> Result<(), ProblemConstructionError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        return Ok(());
    }
    Err(ProblemConstructionError::OutOfDomain {
        parameter,
        node: node.to_string(),
        value,
        domain: NON_NEGATIVE_INTEGER,
    })
}

impl Problem {
    pub fn new(data: ProblemData) -> Result<Problem, ProblemConstructionError> {
        use ProblemConstructionError::*;

        if data.hospitals.is_empty() {
            return Err(NoHospitals);
        }
        if data.bdcs.is_empty() {
            return Err(NoBdcs);
        }

        let mut names = HashSet::new();
        let all_names = data
            .hospitals
            .iter()
            .map(|h| &h.name)
            .chain(data.bdcs.iter().map(|d| &d.name));
        for name in all_names {
            if !names.insert(name.as_str()) {
                return Err(DuplicateName(name.clone()));
            }
        }

        for h in &data.hospitals {
            non_negative_integer("demand", &h.name, h.demand)?;
            non_negative_real("earliest arrival", &h.name, h.earliest)?;
            non_negative_real("latest arrival", &h.name, h.latest)?;
            if h.earliest > h.latest {
                return Err(EmptyTimeWindow {
                    hospital: h.name.clone(),
                    earliest: h.earliest,
                    latest: h.latest,
                });
            }
        }

        for d in &data.bdcs {
            non_negative_real("opening cost", &d.name, d.opening_cost)?;
            non_negative_integer("capacity", &d.name, d.capacity)?;
        }

        let open_bdcs = data
            .open_bdcs
            .iter()
            .map(|name| {
                data.bdcs
                    .iter()
                    .position(|d| &d.name == name)
                    .ok_or_else(|| UnknownOpenBdc(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let n = data.hospitals.len() + data.bdcs.len();
        if data.travel_times.len() != n {
            return Err(TravelTimeSizeMismatch {
                expected: n,
                rows: data.travel_times.len(),
                row: 0,
                length: data.travel_times.first().map(|r| r.len()).unwrap_or(0),
            });
        }
        for (i, row) in data.travel_times.iter().enumerate() {
            if row.len() != n {
                return Err(TravelTimeSizeMismatch {
                    expected: n,
                    rows: n,
                    row: i,
                    length: row.len(),
                });
            }
        }

        let node_names = data
            .hospitals
            .iter()
            .map(|h| &h.name)
            .chain(data.bdcs.iter().map(|d| &d.name))
            .collect::<Vec<_>>();
        for (i, row) in data.travel_times.iter().enumerate() {
            for (j, &t) in row.iter().enumerate() {
                let arc = format!("{}->{}", node_names[i], node_names[j]);
                non_negative_real("travel time", &arc, t)?;
            }
        }

        non_negative_real("unit cost", "instance", data.unit_cost)?;
        if !(data.capacity_divisor.is_finite() && data.capacity_divisor > 0.0) {
            return Err(OutOfDomain {
                parameter: "capacity divisor",
                node: "instance".to_string(),
                value: data.capacity_divisor,
                domain: POSITIVE_REAL,
            });
        }
        non_negative_real("scale", "instance", data.scale)?;
        if let Some(total) = data.aggregate_demand {
            non_negative_real("aggregate demand", "instance", total)?;
        }
        if data.scale < data.hospitals.len() as f64 {
            return Err(ScaleTooSmall {
                scale: data.scale,
                hospitals: data.hospitals.len(),
            });
        }

        Ok(Problem {
            hospitals: data.hospitals,
            bdcs: data.bdcs,
            open_bdcs,
            travel_times: data.travel_times,
            unit_cost: data.unit_cost,
            capacity_divisor: data.capacity_divisor,
            scale: data.scale,
            aggregate_demand: data.aggregate_demand,
        })
    }

    /// A random instance with nodes scattered over a 100x100 square, travel times being the
    /// distances rounded to one decimal. Every BDC can supply the total demand on its own, and the
    /// longest trip of a BDC to a hospital is cut down to the sum of its other hospital trips.
    /// Any single BDC can therefore serve every hospital directly within the arrival time bounds.
    pub fn random<R: Rng>(
        hospitals: usize,
        bdcs: usize,
        rng: &mut R,
    ) -> Result<Problem, ProblemConstructionError> {
        let coordinates = (0..hospitals + bdcs)
            .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect::<Vec<(f64, f64)>>();

        let hospitals = (0..hospitals)
            .map(|i| {
                let earliest = rng.gen_range(0..40) as f64;
                Hospital {
                    name: format!("H{}", i + 1),
                    demand: rng.gen_range(5..=30) as f64,
                    earliest,
                    latest: earliest + rng.gen_range(10..=80) as f64,
                }
            })
            .collect::<Vec<_>>();

        let total: f64 = hospitals.iter().map(|h| h.demand).sum();
        let bdcs = (0..bdcs)
            .map(|d| Bdc {
                name: format!("BDC{}", d + 1),
                opening_cost: rng.gen_range(50..=500) as f64,
                capacity: total + rng.gen_range(0..=50) as f64,
            })
            .collect::<Vec<_>>();

        let open_bdcs = bdcs
            .iter()
            .filter(|_| rng.gen_bool(0.2))
            .map(|d| d.name.clone())
            .collect();

        let mut travel_times = coordinates
            .iter()
            .map(|&(ax, ay)| {
                coordinates
                    .iter()
                    .map(|&(bx, by)| ((ax - bx).hypot(ay - by) * 10.0).round() / 10.0)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let n = hospitals.len();
        for d in n..n + bdcs.len() {
            let trips = &travel_times[d][..n];
            let Some((j, &longest)) = trips.iter().enumerate().max_by_key(|&(_, t)| FloatOrd(*t))
            else {
                continue;
            };
            let rest: f64 = trips
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != j)
                .map(|(_, t)| t)
                .sum();
            if longest > rest {
                travel_times[d][j] = rest;
                travel_times[j][d] = rest;
            }
        }

        let scale = hospitals.len() as f64;
        Problem::new(ProblemData {
            hospitals,
            bdcs,
            open_bdcs,
            travel_times,
            unit_cost: 1.0,
            capacity_divisor: 10.0,
            scale,
            aggregate_demand: Some(total),
        })
    }

    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    pub fn bdcs(&self) -> &[Bdc] {
        &self.bdcs
    }

    /// Positions of the BDCs that must be open
    pub fn open_bdcs(&self) -> &[usize] {
        &self.open_bdcs
    }

    /// Total number of nodes, hospitals and BDCs
    pub fn nodes(&self) -> usize {
        self.hospitals.len() + self.bdcs.len()
    }

    /// The travel time between two nodes, indexed as in the travel time matrix
    pub fn travel_time(&self, from: usize, to: usize) -> Time {
        self.travel_times[from][to]
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    pub fn capacity_divisor(&self) -> f64 {
        self.capacity_divisor
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Aggregate demand as given in the input. Carried along, but not used by the model.
    pub fn aggregate_demand(&self) -> Option<f64> {
        self.aggregate_demand
    }
}

impl TryFrom<ProblemData> for Problem {
    type Error = ProblemConstructionError;

    fn try_from(value: ProblemData) -> Result<Self, Self::Error> {
        Problem::new(value)
    }
}

impl From<Problem> for ProblemData {
    fn from(problem: Problem) -> Self {
        let open_bdcs = problem
            .open_bdcs
            .iter()
            .map(|&d| problem.bdcs[d].name.clone())
            .collect();
        ProblemData {
            hospitals: problem.hospitals,
            bdcs: problem.bdcs,
            open_bdcs,
            travel_times: problem.travel_times,
            unit_cost: problem.unit_cost,
            capacity_divisor: problem.capacity_divisor,
            scale: problem.scale,
            aggregate_demand: problem.aggregate_demand,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;

    /// One BDC and two hospitals, travel time 2 between every pair of distinct nodes
    pub fn small_data() -> ProblemData {
        let hospital = |name: &str, demand: f64, latest: f64| Hospital {
            name: name.to_string(),
            demand,
            earliest: 0.0,
            latest,
        };
        let t = |i: usize, j: usize| if i == j { 0.0 } else { 2.0 };

        ProblemData {
            hospitals: vec![hospital("H1", 10.0, 5.0), hospital("H2", 20.0, 10.0)],
            bdcs: vec![Bdc {
                name: "BDC1".to_string(),
                opening_cost: 50.0,
                capacity: 100.0,
            }],
            open_bdcs: vec![],
            travel_times: (0..3).map(|i| (0..3).map(|j| t(i, j)).collect()).collect(),
            unit_cost: 1.0,
            capacity_divisor: 1.0,
            scale: 2.0,
            aggregate_demand: None,
        }
    }

    pub fn small() -> Problem {
        Problem::new(small_data()).unwrap()
    }

    #[test]
    fn valid_instance_is_accepted() {
        let problem = small();
        assert_eq!(problem.nodes(), 3);
        assert_eq!(problem.travel_time(2, 0), 2.0);
        assert!(problem.open_bdcs().is_empty());
    }

    #[test]
    fn negative_capacity_is_a_data_error() {
        let mut data = small_data();
        data.bdcs[0].capacity = -1.0;
        assert!(matches!(
            Problem::new(data),
            Err(ProblemConstructionError::OutOfDomain {
                parameter: "capacity",
                ..
            })
        ));
    }

    #[test]
    fn fractional_demand_is_a_data_error() {
        let mut data = small_data();
        data.hospitals[1].demand = 2.5;
        assert!(matches!(
            Problem::new(data),
            Err(ProblemConstructionError::OutOfDomain {
                parameter: "demand",
                ..
            })
        ));
    }

    #[test]
    fn open_bdcs_must_be_bdcs() {
        let mut data = small_data();
        data.open_bdcs = vec!["H1".to_string()];
        assert_eq!(
            Problem::new(data),
            Err(ProblemConstructionError::UnknownOpenBdc("H1".to_string()))
        );

        let mut data = small_data();
        data.open_bdcs = vec!["BDC1".to_string()];
        assert_eq!(Problem::new(data).unwrap().open_bdcs(), &[0]);
    }

    #[test]
    fn structural_errors_are_reported() {
        let mut data = small_data();
        data.travel_times[1].pop();
        assert!(matches!(
            Problem::new(data),
            Err(ProblemConstructionError::TravelTimeSizeMismatch { row: 1, length: 2, .. })
        ));

        let mut data = small_data();
        data.hospitals[0].earliest = 6.0;
        assert!(matches!(
            Problem::new(data),
            Err(ProblemConstructionError::EmptyTimeWindow { .. })
        ));

        let mut data = small_data();
        data.scale = 1.0;
        assert!(matches!(
            Problem::new(data),
            Err(ProblemConstructionError::ScaleTooSmall { hospitals: 2, .. })
        ));

        let mut data = small_data();
        data.capacity_divisor = 0.0;
        assert!(Problem::new(data).is_err());

        let mut data = small_data();
        data.bdcs[0].name = "H2".to_string();
        assert_eq!(
            Problem::new(data),
            Err(ProblemConstructionError::DuplicateName("H2".to_string()))
        );
    }

    #[test]
    fn json_is_validated_on_read() {
        let json = serde_json::to_string(&small_data()).unwrap();
        let problem: Problem = serde_json::from_str(&json).unwrap();
        assert_eq!(problem, small());

        let mut data = small_data();
        data.hospitals[0].latest = -3.0;
        let json = serde_json::to_string(&data).unwrap();
        assert!(serde_json::from_str::<Problem>(&json).is_err());
    }

    #[test]
    fn random_instances_are_valid() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let problem = Problem::random(6, 2, &mut rng).unwrap();
        assert_eq!(problem.nodes(), 8);
        assert_eq!(problem.scale(), 6.0);
        for d in problem.bdcs() {
            assert!(d.capacity >= problem.aggregate_demand().unwrap());
        }
    }

    #[test]
    fn random_bdc_trips_fit_within_the_other_trips() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        for (hospitals, bdcs) in [(1, 1), (2, 1), (3, 1), (6, 2)] {
            let problem = Problem::random(hospitals, bdcs, &mut rng).unwrap();
            for d in hospitals..problem.nodes() {
                for j in 0..hospitals {
                    let rest: f64 = (0..hospitals)
                        .filter(|&i| i != j)
                        .map(|i| problem.travel_time(d, i))
                        .sum();
                    assert!(problem.travel_time(d, j) <= rest + 1e-9);
                    assert_eq!(problem.travel_time(d, j), problem.travel_time(j, d));
                }
            }
        }
    }

    #[test]
    fn aggregate_demand_is_checked_when_given() {
        let mut data = small_data();
        data.aggregate_demand = Some(30.0);
        assert_eq!(Problem::new(data).unwrap().aggregate_demand(), Some(30.0));

        for value in [-5.0, f64::NAN, f64::INFINITY] {
            let mut data = small_data();
            data.aggregate_demand = Some(value);
            assert!(matches!(
                Problem::new(data),
                Err(ProblemConstructionError::OutOfDomain {
                    parameter: "aggregate demand",
                    ..
                })
            ));
        }
    }
}
