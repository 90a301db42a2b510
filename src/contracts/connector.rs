//! ZetaConnector contract bindings
//!
//! The connector lets contracts send the bridge chain's native coin to another
//! chain. The `ZetaSent` event carries the destination chain id as an indexed
//! topic next to the payload fields.

use alloy_sol_types::sol;

sol!(
    #[allow(clippy::too_many_arguments)]
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface ZetaConnector {
        event ZetaSent(
            address indexed sender,
            uint256 indexed toChainID,
            bytes to,
            uint256 value,
            uint256 gasLimit,
            bytes message,
            bytes zetaParams
        );
    }
);
