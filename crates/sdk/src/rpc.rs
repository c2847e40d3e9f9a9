//! Alloy-provider-backed implementation of [`ChainState`].

use alloy::{eips::BlockId, primitives::Address, providers::Provider};
use fastnum::D128;

use crate::{
    Chain,
    abi::{Erc20, OptionVault},
    error::SdkError,
    num,
    source::ChainState,
    types,
};

/// Present-time chain reader over a caller-owned provider.
///
/// The provider is passed in and owned here per call-site, never shared
/// through globals; construct one per deployment via [`ChainClient::connect`],
/// which fetches token/vault decimals once.
#[derive(Clone, Debug)]
pub struct ChainClient<P> {
    chain: Chain,
    provider: P,
    base_converter: num::Converter,
    quote_converter: num::Converter,
    size_converter: num::Converter,
    collateral_converter: num::Converter,
}

impl<P: Provider> ChainClient<P> {
    pub async fn connect(chain: Chain, provider: P) -> Result<Self, SdkError> {
        let base = Erc20::new(chain.base_token(), &provider);
        let quote = Erc20::new(chain.quote_token(), &provider);
        let vault = OptionVault::new(chain.vault(), &provider);
        let base_decimals = base.decimals().call().await?;
        let quote_decimals = quote.decimals().call().await?;
        let size_decimals = vault.sizeDecimals().call().await?;
        let collateral_decimals = vault.collateralDecimals().call().await?;
        Ok(Self {
            chain,
            provider,
            base_converter: num::Converter::new(base_decimals),
            quote_converter: num::Converter::new(quote_decimals),
            size_converter: num::Converter::new(size_decimals),
            collateral_converter: num::Converter::new(collateral_decimals),
        })
    }

    pub fn chain(&self) -> &Chain { &self.chain }
}

impl<P: Provider> ChainState for ChainClient<P> {
    async fn latest_block(&self) -> Result<types::BlockPointer, SdkError> {
        let block = self
            .provider
            .get_block(BlockId::latest())
            .await?
            .ok_or_else(|| SdkError::SourceUnavailable("latest block not available".to_string()))?;
        Ok(types::BlockPointer::new(block.header.number, block.header.timestamp))
    }

    async fn current_balance(
        &self,
        owner: Address,
        asset: types::AssetId,
    ) -> Result<D128, SdkError> {
        let (token, converter) = match asset {
            types::AssetId::Base => (self.chain.base_token(), self.base_converter),
            types::AssetId::Quote => (self.chain.quote_token(), self.quote_converter),
        };
        let raw = Erc20::new(token, &self.provider).balanceOf(owner).call().await?;
        converter.from_unsigned(raw)
    }

    async fn open_positions(
        &self,
        owner: Address,
    ) -> Result<Vec<types::OpenPosition>, SdkError> {
        let views = OptionVault::new(self.chain.vault(), &self.provider)
            .getOwnerPositions(owner)
            .call()
            .await?;
        views
            .into_iter()
            .map(|view| {
                let side = match view.side {
                    0 => types::OptionSide::Long,
                    1 => types::OptionSide::Short,
                    other => {
                        return Err(SdkError::InvalidArgument(format!(
                            "unknown position side: {}",
                            other
                        )));
                    },
                };
                Ok(types::OpenPosition {
                    id: view.id,
                    side,
                    size: self.size_converter.from_unsigned(view.size)?,
                    collateral: self.collateral_converter.from_unsigned(view.collateral)?,
                })
            })
            .collect()
    }
}
