pub mod differentiate;
pub mod error;
pub mod quadrature;
pub mod roots;
pub mod solvers;
pub mod stochastic;
pub mod system;
/// The `drift_core` crate provides the numerical engine shared by the drift simulations.
/// Steppers are generic over the scalar type; everything else works in `f64`.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (ODE right-hand sides), `Steppable` (Solvers).
/// - **Solvers**: Fixed-step integrators (Euler, RK2, RK4, Verlet) with reusable scratch buffers.
/// - **Roots / Quadrature / Differentiate**: bisection, Newton-Raphson, Simpson and trapezoid rules, central differences.
/// - **Stochastic**: Monte-Carlo integration and Euler-Maruyama driven by a caller-owned RNG.
pub mod traits;
pub mod trajectory;
pub mod vector;

pub use error::NumericsError;
