// Contracts Module - Public ABIs Only

use ethers::prelude::*;

abigen!(
    Erc20,
    r#"[
        function symbol() external view returns (string)
        function name() external view returns (string)
        function decimals() external view returns (uint8)
        function totalSupply() external view returns (uint256)
    ]"#
);
